//! 핸들러 모듈

pub mod call;
pub mod connection;
pub mod stream;
pub mod turn;

pub use call::*;
pub use connection::*;
pub use stream::*;
pub use turn::*;
