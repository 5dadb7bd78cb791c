mod catalog;
mod entry;

pub use catalog::{list_entries, Catalog, EntryCatalog};
pub use entry::{
    build_url, encode_segment, is_image_name, Entry, ListingContext, IMAGE_EXTENSIONS,
    PARENT_NAME,
};
