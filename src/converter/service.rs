//! Conversion façade: invoke the converter, then locate (and check) its output.

use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info};
use tokio::sync::Semaphore;

use super::invoker::ConverterInvoker;
use super::locator::{locate, verify_pdf};
use super::traits::DocumentConverter;
use super::{ConversionError, ConversionRequest, ConversionResult};
use crate::config::ConverterConfig;

#[derive(Debug, Clone)]
pub struct ConversionService {
    invoker: ConverterInvoker,
    slots: Arc<Semaphore>,
    verify_output: bool,
}

impl ConversionService {
    pub fn new(invoker: ConverterInvoker, max_concurrent: usize, verify_output: bool) -> Self {
        Self {
            invoker,
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            verify_output,
        }
    }

    /// Builds the service from config.
    ///
    /// Without profile isolation the converter instances would fight over one
    /// profile lock, so conversions are serialized.
    pub fn from_config(config: &ConverterConfig) -> Self {
        let max_concurrent = if config.isolate_profile {
            config.max_concurrent
        } else {
            1
        };
        Self::new(
            ConverterInvoker::new(config.program.clone(), config.timeout),
            max_concurrent,
            config.verify_output,
        )
    }

    pub fn invoker(&self) -> &ConverterInvoker {
        &self.invoker
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    async fn run(&self, request: &ConversionRequest) -> ConversionResult {
        // Only fails once the gate has been closed.
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| ConversionError::Unavailable)?;

        let completion = self
            .invoker
            .invoke(
                &request.input_path,
                &request.output_dir,
                request.profile_dir.as_deref(),
            )
            .await?;

        let output_path = locate(&request.input_path, &request.output_dir)?;
        if self.verify_output {
            verify_pdf(&output_path).await?;
        }

        info!(
            "Converted {} -> {} in {:?}",
            request.input_path.display(),
            output_path.display(),
            completion.elapsed
        );
        Ok(output_path)
    }
}

#[async_trait]
impl DocumentConverter for ConversionService {
    async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        let result = self.run(request).await;
        if let Err(e) = &result {
            error!(
                "Conversion of {} failed ({:?}): {}",
                request.input_path.display(),
                e.kind(),
                e
            );
        }
        result
    }

    fn name(&self) -> &str {
        self.invoker.program()
    }
}
