pub mod api;
pub mod http;
pub mod store;

pub use api::{NewCard, NewPack, PackUpdate, RemoteApi, ReviewOutcome};
pub use http::HttpApi;
pub use store::RemoteStore;
