pub mod data_txt;
pub mod html;
pub mod json;
pub mod zip;
