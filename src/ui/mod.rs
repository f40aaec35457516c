mod layout;
pub mod spinner;

pub use layout::draw_ui;
