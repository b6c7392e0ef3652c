/// Source of fresh tokens (OS randomness in production, fixed values in tests).
pub trait TokenSource: Send + Sync {
    /// Produce a random, printable token of exactly `len` characters.
    fn generate(&self, len: usize) -> anyhow::Result<String>;
}

impl<S: TokenSource + ?Sized> TokenSource for &S {
    fn generate(&self, len: usize) -> anyhow::Result<String> {
        (**self).generate(len)
    }
}
