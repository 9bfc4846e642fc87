//! File I/O: filesystem helpers, notebook loading, media, anchors

mod fs;
mod media;
mod notebook;
mod slug;

pub use fs::{
    CaseSensitivity, FsError, copy_dir, copy_file, ensure_dir, relative_path,
    rename_if_exists_case_insensitive, unique_name,
};
pub use media::{
    copy_attachments, copy_media_files, image_links, local_media_path, replace_img_sources,
};
pub use notebook::{FOLDER_META_FILE, FsTreeProvider, NOTEBOOK_META_FILE, open_notebook};
pub use slug::{AnchorIds, slugify};
