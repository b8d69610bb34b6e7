pub mod bind;
pub mod list;
pub mod pool;
pub mod select;
pub mod unbind;
