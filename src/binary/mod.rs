mod buf;

pub use buf::Buf;
