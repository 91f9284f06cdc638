pub mod contract;
pub mod form_field;
pub mod markup;
pub mod merge;
pub mod place_holder;
pub mod template;
