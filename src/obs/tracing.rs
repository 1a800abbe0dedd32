// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`]; a tracing-wrapped future when the
/// `tracing` feature is enabled, the bare future otherwise.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; a tracing-wrapped future when the
/// `tracing` feature is enabled, the bare future otherwise.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// One-shot span wrapped around a single flow invocation.
///
/// Every engine operation opens one, tags it with the [`FlowKind`] and the call-site
/// stage, and hands its whole body to [`instrument`](Self::instrument). Instrumentation
/// consumes the span, so a flow cannot accidentally hold it across unrelated awaits.
#[derive(Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span tagged with the flow kind and call-site stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("pkce_relay.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Attaches the span to a flow body, consuming the span.
	pub fn instrument<Fut>(self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span)
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrumented_flow_resolves_to_the_body_value() {
		let value = FlowSpan::new(FlowKind::Refresh, "instrumented_flow")
			.instrument(async { 42 })
			.await;

		assert_eq!(value, 42);
	}
}
