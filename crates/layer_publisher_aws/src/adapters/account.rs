pub trait AccountResolver {
    fn account_id(&self) -> Result<String, String>;
}
