pub mod parcel;
pub mod payment;
pub mod tracking;
pub mod user;

pub use parcel::*;
pub use payment::*;
pub use tracking::*;
pub use user::*;
