use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ai_sdk_core::{
    GenerationOptions, PartStream, SdkError, TextGenerationPipeline, TextStreamer,
};
use crate::ai_sdk_types::v2 as v2t;

/// Everything a background generation needs; owned so it can be spawned.
pub struct StreamJob {
    pub pipeline: Arc<dyn TextGenerationPipeline>,
    pub prompt: String,
    pub options: GenerationOptions,
    pub abort_signal: Option<CancellationToken>,
}

/// Run a generation in the background and expose its token callbacks as a stream.
///
/// Every token the runtime pushes becomes one `TextDelta`. The stream ends
/// once the generation call returns; a failure is its last item. Tokens
/// pushed after that point are dropped.
pub fn spawn_token_stream(job: StreamJob) -> PartStream {
    let (tx, mut rx) = mpsc::unbounded_channel::<Result<v2t::StreamPart, SdkError>>();
    let token_tx = tx.downgrade();
    let streamer = TextStreamer::new(job.pipeline.tokenizer(), move |text| {
        if let Some(sender) = token_tx.upgrade() {
            let _ = sender.send(Ok(v2t::StreamPart::TextDelta { text }));
        }
    });

    tokio::spawn(async move {
        let StreamJob {
            pipeline,
            prompt,
            options,
            abort_signal,
        } = job;
        let generation = pipeline.generate(&prompt, &options, Some(streamer));
        let result = match abort_signal {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(SdkError::Cancelled),
                res = generation => res.map(|_| ()).map_err(SdkError::from),
            },
            None => generation.await.map(|_| ()).map_err(SdkError::from),
        };
        if let Err(err) = result {
            tracing::warn!("[TRANSFORMERS]: stream terminated: {}", err.format_details());
            let _ = tx.send(Err(err));
        }
    });

    Box::pin(async_stream::stream! {
        while let Some(item) = rx.recv().await {
            yield item;
        }
    })
}
