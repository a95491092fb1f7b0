use derive_more::Display;

/// A visual attribute's color. Carried and copied by the engine (§3's
/// `vattr?`), never interpreted — the visual-attribute validator is an
/// external collaborator (spec.md §1).
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum WebColor {
    #[display(fmt = "{}", _0)]
    RGB(RGBColor),
    #[display(fmt = "{}", _0)]
    Named(NamedColor),
}

impl Default for WebColor {
    fn default() -> Self {
        WebColor::Named(NamedColor::Black)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[display(fmt = "#{:02X}{:02X}{:02X}", red, green, blue)]
pub struct RGBColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RGBColor {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NamedColor {
    #[display(fmt = "white")]
    White,
    #[display(fmt = "black")]
    Black,
}
