//! Composable, single-use pipelines over a chunk stream.
//!
//! A [`ChunkPipeline`] wraps a pull-based source of chunks and layers lazy
//! stages over it: `filter`, `map`, and `scan` at chunk granularity,
//! `matching` for routing a matching subset through a nested sub-chain, and
//! `parts` / `parts_matching` to switch the rest of the chain to part
//! granularity. Materializing the chain re-serializes any parts produced by
//! part-level stages and runs the step-boundary gate over the final output,
//! so boundary markers whose content was dropped disappear.
//!
//! Every combinator and terminal operation takes the pipeline by value:
//! chains are single-consumption by construction, and the source is released
//! as soon as the output stream is dropped.
//!
//! Each stage keeps its own part tracker, so the partial-part view handed to
//! a callback is derived from exactly the chunks that reached that stage.

use std::collections::HashMap;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use weft_types::{Chunk, Part, StreamError};

use crate::assemble::{Assembled, PartAssembler, PartKey, is_terminal, part_key};
use crate::gate::StepGate;
use crate::serialize::serialize_part;

/// A pull-based, single-reader stream of chunks.
///
/// Pipelines consume and produce this shape, so they chain without adapters.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk, StreamError>> + Send>>;

/// A pull-based stream of sealed parts.
pub type PartStream = Pin<Box<dyn Stream<Item = Result<Part, StreamError>> + Send>>;

/// The context handed to chunk-level stage callbacks.
///
/// `part` is the partial part the current chunk belongs to: every field
/// derivable from the chunks seen for its part id so far, including the
/// current chunk, without waiting for the part to seal. `history` is the
/// read-only list of parts already sealed at this stage, oldest first.
#[derive(Clone, Copy)]
pub struct PartView<'a> {
    /// Partial part for the current chunk; `None` for meta chunks.
    pub part: Option<&'a Part>,
    /// Parts sealed so far at this stage, oldest first.
    pub history: &'a [Part],
}

/// Per-stage bookkeeping that derives [`PartView`]s from the chunks flowing
/// through the stage.
#[derive(Default)]
struct PartTracker {
    assembler: PartAssembler,
    history: Vec<Part>,
    // A part sealed by the current chunk is the chunk's own partial view,
    // not history; it joins the history at the next chunk.
    last_sealed: Option<Part>,
    current: CurrentView,
}

#[derive(Default)]
enum CurrentView {
    #[default]
    None,
    Open(PartKey),
    LastSealed,
}

impl PartTracker {
    fn new() -> Self {
        Self::default()
    }

    fn observe(&mut self, chunk: &Chunk) {
        if let Some(part) = self.last_sealed.take() {
            self.history.push(part);
        }
        match self.assembler.push(chunk.clone()) {
            Assembled::Passthrough(_) => self.current = CurrentView::None,
            Assembled::Pending => {
                self.current = match part_key(chunk) {
                    Some(key) => CurrentView::Open(key),
                    None => CurrentView::None,
                };
            }
            Assembled::Sealed(part) => {
                self.last_sealed = Some(part);
                self.current = CurrentView::LastSealed;
            }
        }
    }

    fn view(&self) -> PartView<'_> {
        let part = match &self.current {
            CurrentView::None => None,
            CurrentView::Open(key) => self.assembler.open_part(key),
            CurrentView::LastSealed => self.last_sealed.as_ref(),
        };
        PartView { part, history: &self.history }
    }
}

/// Internal item of a part-granularity chain: sealed parts mixed with
/// chunks that pass through at chunk granularity (meta chunks, `step-end`
/// markers, and streamed-through runs).
enum PartEvent {
    Part(Part),
    Chunk(Chunk),
}

// ─── ChunkPipeline ───────────────────────────────────────────────────────────

/// A single-use chain of chunk-level stages over a chunk source.
pub struct ChunkPipeline {
    inner: ChunkStream,
}

impl ChunkPipeline {
    /// Build a pipeline over any chunk source.
    #[must_use]
    pub fn new(source: impl Stream<Item = Result<Chunk, StreamError>> + Send + 'static) -> Self {
        Self { inner: Box::pin(source) }
    }

    /// Build a pipeline over an in-memory chunk sequence.
    #[must_use]
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self::new(futures::stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Drop chunks failing the predicate.
    #[must_use]
    pub fn filter<F>(self, mut pred: F) -> Self
    where
        F: for<'a> FnMut(&Chunk, PartView<'a>) -> bool + Send + 'static,
    {
        let mut source = self.inner;
        Self {
            inner: Box::pin(async_stream::stream! {
                let mut tracker = PartTracker::new();
                while let Some(item) = source.next().await {
                    match item {
                        Ok(chunk) => {
                            tracker.observe(&chunk);
                            if pred(&chunk, tracker.view()) {
                                yield Ok(chunk);
                            }
                        }
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }),
        }
    }

    /// Transform each chunk into zero, one, or many chunks.
    #[must_use]
    pub fn map<F>(self, mut f: F) -> Self
    where
        F: for<'a> FnMut(Chunk, PartView<'a>) -> Vec<Chunk> + Send + 'static,
    {
        let mut source = self.inner;
        Self {
            inner: Box::pin(async_stream::stream! {
                let mut tracker = PartTracker::new();
                while let Some(item) = source.next().await {
                    match item {
                        Ok(chunk) => {
                            tracker.observe(&chunk);
                            for out in f(chunk, tracker.view()) {
                                yield Ok(out);
                            }
                        }
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }),
        }
    }

    /// Stateful `map`: `state` is threaded through the whole stream.
    #[must_use]
    pub fn scan<S, F>(self, state: S, step: F) -> Self
    where
        S: Send + 'static,
        F: for<'a> FnMut(&mut S, Chunk, PartView<'a>) -> Vec<Chunk> + Send + 'static,
    {
        self.scan_finalize(state, step, |_| Vec::new())
    }

    /// [`scan`](Self::scan) with a finalize hook, invoked once at end of
    /// stream to flush buffered output.
    #[must_use]
    pub fn scan_finalize<S, F, G>(self, state: S, mut step: F, finalize: G) -> Self
    where
        S: Send + 'static,
        F: for<'a> FnMut(&mut S, Chunk, PartView<'a>) -> Vec<Chunk> + Send + 'static,
        G: FnOnce(S) -> Vec<Chunk> + Send + 'static,
    {
        let mut source = self.inner;
        Self {
            inner: Box::pin(async_stream::stream! {
                let mut tracker = PartTracker::new();
                let mut state = state;
                while let Some(item) = source.next().await {
                    match item {
                        Ok(chunk) => {
                            tracker.observe(&chunk);
                            for out in step(&mut state, chunk, tracker.view()) {
                                yield Ok(out);
                            }
                        }
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
                for out in finalize(state) {
                    yield Ok(out);
                }
            }),
        }
    }

    /// Route chunks matching `pred` through a nested sub-chain; everything
    /// else passes through unchanged, in arrival order.
    #[must_use]
    pub fn matching<P, B>(self, mut pred: P, build: B) -> Self
    where
        P: for<'a> FnMut(&Chunk, PartView<'a>) -> bool + Send + 'static,
        B: FnOnce(SubChain) -> SubChain,
    {
        let mut sub = build(SubChain::new());
        let mut source = self.inner;
        Self {
            inner: Box::pin(async_stream::stream! {
                let mut tracker = PartTracker::new();
                while let Some(item) = source.next().await {
                    match item {
                        Ok(chunk) => {
                            tracker.observe(&chunk);
                            if pred(&chunk, tracker.view()) {
                                for out in sub.apply(chunk, tracker.view()) {
                                    yield Ok(out);
                                }
                            } else {
                                yield Ok(chunk);
                            }
                        }
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }),
        }
    }

    /// Switch the rest of the chain to part granularity: every content run
    /// is assembled and sealed parts flow to the part-level stages.
    #[must_use]
    pub fn parts(self) -> PartPipeline {
        let mut source = self.inner;
        PartPipeline {
            inner: Box::pin(async_stream::stream! {
                let mut assembler = PartAssembler::new();
                while let Some(item) = source.next().await {
                    match item {
                        Ok(chunk) => match assembler.push(chunk) {
                            Assembled::Passthrough(chunk) => yield Ok(PartEvent::Chunk(chunk)),
                            Assembled::Pending => {}
                            Assembled::Sealed(part) => yield Ok(PartEvent::Part(part)),
                        },
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
                for part in assembler.finish() {
                    yield Ok(PartEvent::Part(part));
                }
            }),
        }
    }

    /// Like [`parts`](Self::parts), but `pred` decides per run, at its
    /// first chunk and from the partial-part view, whether the run is
    /// buffered into a part (and handed to the part-level stages) or its
    /// chunks stream through untouched.
    ///
    /// A buffered run's chunks are re-emitted contiguously at its sealing
    /// point; streamed-through runs keep their original interleaving.
    #[must_use]
    pub fn parts_matching<P>(self, mut pred: P) -> PartPipeline
    where
        P: for<'a> FnMut(&Chunk, PartView<'a>) -> bool + Send + 'static,
    {
        let mut source = self.inner;
        PartPipeline {
            inner: Box::pin(async_stream::stream! {
                let mut tracker = PartTracker::new();
                let mut assembler = PartAssembler::new();
                let mut decisions: HashMap<PartKey, bool> = HashMap::new();
                while let Some(item) = source.next().await {
                    let chunk = match item {
                        Ok(chunk) => chunk,
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    };
                    tracker.observe(&chunk);
                    if chunk.is_meta() || matches!(chunk, Chunk::StepEnd) {
                        yield Ok(PartEvent::Chunk(chunk));
                        continue;
                    }
                    let key = part_key(&chunk);
                    let buffer = match &key {
                        Some(key) => match decisions.get(key) {
                            Some(decision) => *decision,
                            None => {
                                let decision = pred(&chunk, tracker.view());
                                decisions.insert(key.clone(), decision);
                                decision
                            }
                        },
                        // Single-chunk run: decide on the chunk itself.
                        None => pred(&chunk, tracker.view()),
                    };
                    if let (Some(key), true) = (&key, is_terminal(&chunk)) {
                        decisions.remove(key);
                    }
                    if buffer {
                        match assembler.push(chunk) {
                            Assembled::Passthrough(chunk) => yield Ok(PartEvent::Chunk(chunk)),
                            Assembled::Pending => {}
                            Assembled::Sealed(part) => yield Ok(PartEvent::Part(part)),
                        }
                    } else {
                        yield Ok(PartEvent::Chunk(chunk));
                    }
                }
                for part in assembler.finish() {
                    yield Ok(PartEvent::Part(part));
                }
            }),
        }
    }

    /// Materialize the chain as a chunk stream, with the step-boundary gate
    /// applied to the surviving output.
    #[must_use]
    pub fn into_stream(self) -> ChunkStream {
        gate_chunks(self.inner)
    }

    /// Drive the chain to completion and collect the output chunks.
    ///
    /// # Errors
    ///
    /// The first upstream error terminates the chain and is returned.
    pub async fn collect(self) -> Result<Vec<Chunk>, StreamError> {
        collect_chunks(self.into_stream()).await
    }

    /// Drive the chain to completion, discarding the output.
    ///
    /// # Errors
    ///
    /// The first upstream error terminates the chain and is returned.
    pub async fn consume(self) -> Result<(), StreamError> {
        let mut stream = self.into_stream();
        while let Some(item) = stream.next().await {
            item?;
        }
        Ok(())
    }
}

/// A nested chain of chunk-level stages used by
/// [`ChunkPipeline::matching`]. Stages run in order; a chunk dropped by a
/// stage skips the rest.
pub struct SubChain {
    stages: Vec<Box<dyn for<'a> FnMut(Chunk, PartView<'a>) -> Vec<Chunk> + Send>>,
}

impl SubChain {
    fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Drop matching-route chunks failing the predicate.
    #[must_use]
    pub fn filter<F>(mut self, mut pred: F) -> Self
    where
        F: for<'a> FnMut(&Chunk, PartView<'a>) -> bool + Send + 'static,
    {
        self.stages.push(Box::new(move |chunk, view| {
            if pred(&chunk, view) { vec![chunk] } else { Vec::new() }
        }));
        self
    }

    /// Transform matching-route chunks into zero, one, or many chunks.
    #[must_use]
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: for<'a> FnMut(Chunk, PartView<'a>) -> Vec<Chunk> + Send + 'static,
    {
        self.stages.push(Box::new(f));
        self
    }

    fn apply(&mut self, chunk: Chunk, view: PartView<'_>) -> Vec<Chunk> {
        let mut current = vec![chunk];
        for stage in &mut self.stages {
            let mut next = Vec::new();
            for chunk in current {
                next.extend(stage(chunk, view));
            }
            current = next;
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

// ─── PartPipeline ────────────────────────────────────────────────────────────

/// The part-granularity tail of a pipeline, produced by
/// [`ChunkPipeline::parts`] or [`ChunkPipeline::parts_matching`].
///
/// Part-level callbacks receive the read-only history of parts previously
/// seen by that stage, oldest first.
pub struct PartPipeline {
    inner: Pin<Box<dyn Stream<Item = Result<PartEvent, StreamError>> + Send>>,
}

impl PartPipeline {
    /// Drop parts failing the predicate.
    #[must_use]
    pub fn filter<F>(self, mut pred: F) -> Self
    where
        F: FnMut(&Part, &[Part]) -> bool + Send + 'static,
    {
        let mut source = self.inner;
        Self {
            inner: Box::pin(async_stream::stream! {
                let mut history: Vec<Part> = Vec::new();
                while let Some(item) = source.next().await {
                    match item {
                        Ok(PartEvent::Part(part)) => {
                            let keep = pred(&part, &history);
                            if keep {
                                yield Ok(PartEvent::Part(part.clone()));
                            }
                            history.push(part);
                        }
                        Ok(event) => yield Ok(event),
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }),
        }
    }

    /// Transform each part.
    #[must_use]
    pub fn map<F>(self, mut f: F) -> Self
    where
        F: FnMut(Part, &[Part]) -> Part + Send + 'static,
    {
        self.flat_map(move |part, history| vec![f(part, history)])
    }

    /// Transform each part into zero, one, or many parts.
    #[must_use]
    pub fn flat_map<F>(self, mut f: F) -> Self
    where
        F: FnMut(Part, &[Part]) -> Vec<Part> + Send + 'static,
    {
        let mut source = self.inner;
        Self {
            inner: Box::pin(async_stream::stream! {
                let mut history: Vec<Part> = Vec::new();
                while let Some(item) = source.next().await {
                    match item {
                        Ok(PartEvent::Part(part)) => {
                            let out = f(part.clone(), &history);
                            history.push(part);
                            for part in out {
                                yield Ok(PartEvent::Part(part));
                            }
                        }
                        Ok(event) => yield Ok(event),
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }),
        }
    }

    /// Materialize the chain as a chunk stream: parts are re-serialized
    /// into chunk sequences and the step-boundary gate runs over the
    /// surviving output.
    #[must_use]
    pub fn into_stream(self) -> ChunkStream {
        let mut source = self.inner;
        gate_chunks(Box::pin(async_stream::stream! {
            while let Some(item) = source.next().await {
                match item {
                    Ok(PartEvent::Chunk(chunk)) => yield Ok(chunk),
                    Ok(PartEvent::Part(part)) => match serialize_part(&part) {
                        Ok(chunks) => {
                            for chunk in chunks {
                                yield Ok(chunk);
                            }
                        }
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    },
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
        }))
    }

    /// Expose the chain at part granularity: sealed parts only, without
    /// re-serialization. Passthrough chunks are discarded.
    #[must_use]
    pub fn into_parts(self) -> PartStream {
        let mut source = self.inner;
        Box::pin(async_stream::stream! {
            while let Some(item) = source.next().await {
                match item {
                    Ok(PartEvent::Part(part)) => yield Ok(part),
                    Ok(PartEvent::Chunk(_)) => {}
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
        })
    }

    /// Drive the chain to completion and collect the output chunks.
    ///
    /// # Errors
    ///
    /// The first upstream or serialization error terminates the chain and
    /// is returned.
    pub async fn collect(self) -> Result<Vec<Chunk>, StreamError> {
        collect_chunks(self.into_stream()).await
    }

    /// Drive the chain to completion, discarding the output.
    ///
    /// # Errors
    ///
    /// The first upstream or serialization error terminates the chain and
    /// is returned.
    pub async fn consume(self) -> Result<(), StreamError> {
        let mut stream = self.into_stream();
        while let Some(item) = stream.next().await {
            item?;
        }
        Ok(())
    }

    /// Drive the chain to completion and collect the sealed parts.
    ///
    /// # Errors
    ///
    /// The first upstream error terminates the chain and is returned.
    pub async fn collect_parts(self) -> Result<Vec<Part>, StreamError> {
        let mut stream = self.into_parts();
        let mut parts = Vec::new();
        while let Some(item) = stream.next().await {
            parts.push(item?);
        }
        Ok(parts)
    }
}

fn gate_chunks(mut source: ChunkStream) -> ChunkStream {
    Box::pin(async_stream::stream! {
        let mut gate = StepGate::new();
        while let Some(item) = source.next().await {
            match item {
                Ok(chunk) => {
                    for out in gate.push(chunk) {
                        yield Ok(out);
                    }
                }
                Err(err) => {
                    yield Err(err);
                    return;
                }
            }
        }
    })
}

async fn collect_chunks(mut stream: ChunkStream) -> Result<Vec<Chunk>, StreamError> {
    let mut chunks = Vec::new();
    while let Some(item) = stream.next().await {
        chunks.push(item?);
    }
    Ok(chunks)
}
