//! Placeholder stills used when image generation is unavailable.

/// Random-seeded stock image URLs of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct Placeholder {
    width: u32,
    height: u32,
}

impl Placeholder {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A fresh URL; the random seed keeps consecutive scenes visually distinct.
    pub fn url(&self) -> String {
        format!(
            "https://picsum.photos/seed/{}/{}/{}",
            rand::random::<u32>(),
            self.width,
            self.height
        )
    }
}
