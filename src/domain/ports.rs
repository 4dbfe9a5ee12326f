use crate::core::generator::GeneratorOptions;
use crate::core::system::System;
use crate::utils::error::Result;

/// 輸出目的地. Paths are relative to `root()`, an empty path is the root itself.
pub trait Storage: Send + Sync {
    fn root(&self) -> &str;
    /// `Ok(false)` only when the path is absent; any other failure is an error.
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Removes the root and everything below it. An absent root is not an error.
    fn remove_root(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Builds the initial system: applications, hosts, declared modules and
/// registered fragment producers.
pub trait SystemSource {
    fn build_system(&self) -> Result<System>;
    fn generator_options(&self) -> GeneratorOptions;
}
