pub mod file_storage;
pub mod memory_storage;
pub mod navigator;
pub mod reqwest_transport;

pub use file_storage::FileSessionStorage;
pub use memory_storage::MemorySessionStorage;
pub use navigator::ConsoleNavigator;
pub use reqwest_transport::ReqwestTransport;
