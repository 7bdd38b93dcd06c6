pub mod transform_file;

pub use transform_file::{
    format_transform, format_transform_group, load_transform_group, parse_transform,
    parse_transform_group, read_transform_group, save_transform_group,
};
