use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

pub type TextStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait ReviewProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    // Providers without a streaming API fall back to a single chunk.
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream> {
        let text = self.generate(prompt).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }

    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn supports_batch(&self) -> bool {
        true
    }
}
