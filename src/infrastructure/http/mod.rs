pub mod clients;

pub use clients::{
    HttpMediaServiceClient, HttpProductServiceClient, MediaProbe, MediaServiceApi,
    ProductServiceApi,
};
