mod gray;
pub mod integral;
pub mod io;

pub use self::gray::GrayView;
pub use self::integral::IntegralImages;
