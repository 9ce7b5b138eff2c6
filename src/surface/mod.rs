pub mod mock;
pub mod terminal;

/// The display and input boundary a dispatcher talks to.
///
/// One text field to read, two regions to write, and a way to get the
/// user's attention. Methods take `&self` so overlapping operations can
/// share a surface; implementations own their interior mutability.
pub trait Surface: Send + Sync {
    /// Current contents of the prompt field, untrimmed.
    fn prompt_text(&self) -> String;

    /// Replace the summary region.
    fn set_summary(&self, text: &str);

    /// Replace the categorization region.
    fn set_categorization(&self, text: &str);

    /// Surface a message the user must see.
    fn alert(&self, message: &str);
}
