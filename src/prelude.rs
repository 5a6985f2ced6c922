pub use std::convert::{TryFrom, TryInto};

pub use log::{trace, warn};
pub use once_cell::sync::Lazy;
pub use regex::Regex;
pub use url::Url;

pub use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;
