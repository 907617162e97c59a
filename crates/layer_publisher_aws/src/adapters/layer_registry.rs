use layer_publisher_core::contract::LayerVersionListing;

pub trait LayerRegistry {
    fn list_layer_names(&self) -> Result<Vec<String>, String>;
    fn list_layer_versions(&self, layer_name: &str) -> Result<Vec<LayerVersionListing>, String>;
}
