//! Pure, dependency-free helper functions used by the domain types.

pub mod extraction;

pub use extraction::{
    class_group_from_descricao, discipline_code_from_title, extract_by_delimiter,
    extract_with_filter, instructor_from_hover_info, location_from_descricao,
};
