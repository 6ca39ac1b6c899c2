use std::rc::Rc;

/// Number of `x` widths a tab stop spans.
pub const TAB_SPACE: i32 = 4;

/// Measurement capability provided by the renderer.
///
/// The edit engine never talks to a font backend directly; every width and
/// height it needs goes through this trait, so the same document can be laid
/// out for a pixel renderer or for terminal cells.
pub trait FontMetrics {
    fn string_width(&self, font: &FontDescriptor, text: &[u8]) -> i32;
    fn font_height(&self, font: &FontDescriptor) -> i32;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontDescriptor {
    pub family: String,
    pub size: u16,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: String::from("default"),
            size: 14,
            bold: false,
            italic: false,
        }
    }
}

/// Font and color applied to the text following a style-switch marker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    /// 0xRRGGBB
    pub color: u32,
    pub font: FontDescriptor,
}

impl Style {
    pub fn new(color: u32, font: FontDescriptor) -> Self {
        Self { color, font }
    }

    pub fn with_color(color: u32) -> Self {
        Self {
            color,
            font: FontDescriptor::default(),
        }
    }

    pub fn string_width(&self, metrics: &dyn FontMetrics, text: &[u8]) -> i32 {
        metrics.string_width(&self.font, text)
    }

    pub fn tab_width(&self, metrics: &dyn FontMetrics) -> i32 {
        self.string_width(metrics, b"x") * TAB_SPACE
    }

    pub fn height(&self, metrics: &dyn FontMetrics) -> i32 {
        metrics.font_height(&self.font)
    }

    // Ascent is not part of the metrics interface; three quarters of the
    // line height is close enough for the fonts we lay out.
    pub fn baseline(&self, metrics: &dyn FontMetrics) -> i32 {
        self.height(metrics) * 3 / 4
    }
}

/// Styles addressable by small integer id. Id 0 is the default style and is
/// always present.
#[derive(Clone, Debug)]
pub struct StyleRegistry {
    styles: Vec<Rc<Style>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self {
            styles: vec![Rc::new(Style::default())],
        }
    }

    /// Returns the style for `id`, falling back to the default style for
    /// ids that were never registered.
    pub fn get(&self, id: usize) -> &Rc<Style> {
        self.styles.get(id).unwrap_or(&self.styles[0])
    }

    pub fn default_style(&self) -> &Rc<Style> {
        &self.styles[0]
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn id_of(&self, style: &Rc<Style>) -> Option<usize> {
        self.styles
            .iter()
            .position(|candidate| Rc::ptr_eq(candidate, style))
    }

    /// Registers `style` unless the very same object is already known and
    /// returns its id.
    pub fn register(&mut self, style: Rc<Style>) -> usize {
        if let Some(id) = self.id_of(&style) {
            return id;
        }
        self.styles.push(style);
        self.styles.len() - 1
    }

    pub fn set_default(&mut self, style: Rc<Style>) {
        self.styles[0] = style;
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_same_style_twice_reuses_id() {
        let mut registry = StyleRegistry::new();
        let red = Rc::new(Style::with_color(0xff0000));
        let first = registry.register(red.clone());
        let second = registry.register(red.clone());
        assert_eq!(first, 1);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(Rc::strong_count(&red), 2);
    }

    #[test]
    fn equal_but_distinct_styles_get_distinct_ids() {
        let mut registry = StyleRegistry::new();
        let a = registry.register(Rc::new(Style::with_color(0x00ff00)));
        let b = registry.register(Rc::new(Style::with_color(0x00ff00)));
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_id_falls_back_to_default() {
        let mut registry = StyleRegistry::new();
        let blue = Rc::new(Style::with_color(0x0000ff));
        registry.set_default(blue.clone());
        assert!(Rc::ptr_eq(registry.get(42), &blue));
    }
}
