pub mod commodity_api;
pub mod exchangerate_api;
pub mod frankfurter;
pub mod mock;
pub mod rate;
pub mod util;

pub use commodity_api::{CommodityApiTier, FallbackCommodityProvider};
pub use exchangerate_api::ExchangeRateApiProvider;
pub use frankfurter::FrankfurterProvider;
pub use mock::MockGenerator;
pub use rate::FallbackRateProvider;
