pub mod css_concat;
pub mod path_ext;
pub mod xxhash;
