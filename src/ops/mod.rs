pub mod group_ops;
pub mod filter_ops;
pub mod convert_ops;
pub mod quickdial_ops;
pub mod image_ops;
pub mod router_ops;
pub mod sync_ops;
