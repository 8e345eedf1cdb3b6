//! Request descriptors and safe re-submission across attempts.
//!
//! A request body may be consumable only once, so a call that can issue more
//! than one attempt has to duplicate the request *before* the transport
//! consumes it. [`FetchInput`] classifies each descriptor once, at call
//! entry, into a [`Descriptor`]: plain identifiers are reused freely, while
//! requests carrying a single-use body are duplicated ahead of every attempt
//! that might be followed by another.

/// A value the wrapped transport accepts as its request descriptor.
///
/// Implementations come in two shapes, mirroring the [`Descriptor`]
/// variants:
///
/// - plain identifiers (a URL string, an [`http::Uri`]) carry no
///   single-consumption state and classify as `Reusable`;
/// - request objects with a body ([`http::Request`], `reqwest::Request`
///   behind the `reqwest` feature) classify as `SingleUse` and expose their
///   duplication capability through [`duplicate`](FetchInput::duplicate).
///
/// # Examples
///
/// ```rust
/// use refetch::{Descriptor, FetchInput};
///
/// let descriptor = String::from("https://example.test").into_descriptor();
/// assert!(matches!(descriptor, Descriptor::Reusable(_)));
/// ```
pub trait FetchInput: Sized {
    /// Classify this descriptor for replay across attempts. Called once per
    /// wrapped call, at entry.
    fn into_descriptor(self) -> Descriptor<Self>;

    /// Produce an independently consumable copy, or `None` when the body
    /// cannot be duplicated.
    ///
    /// `Reusable` implementations must always return `Some`.
    fn duplicate(&self) -> Option<Self>;
}

/// A request descriptor classified for replay.
#[derive(Debug, Clone)]
pub enum Descriptor<I> {
    /// A plain identifier with no attached body. Copies can be taken at any
    /// point without disturbing an in-flight attempt.
    Reusable(I),
    /// Carries a body consumable at most once. A duplicate must be split
    /// off before the transport reads the held request.
    SingleUse(I),
}

impl<I: FetchInput> Descriptor<I> {
    fn into_inner(self) -> I {
        match self {
            Self::Reusable(input) | Self::SingleUse(input) => input,
        }
    }

    /// Yield the value to put on the wire for this attempt, and whatever
    /// remains consumable for the attempt after it.
    ///
    /// When no further attempt is possible the held descriptor is handed
    /// over whole; a run with N retries under a status-set policy therefore
    /// performs exactly N duplications. Otherwise the single-use case sends
    /// the held request and retains a duplicate taken *before* the
    /// transport can consume it. A `None` reserve means a later retry
    /// cannot be honored.
    pub(crate) fn split(self, may_retry: bool) -> (I, Option<Self>) {
        if !may_retry {
            return (self.into_inner(), None);
        }
        match self {
            Self::Reusable(input) => match input.duplicate() {
                Some(copy) => (copy, Some(Self::Reusable(input))),
                None => (input, None),
            },
            Self::SingleUse(input) => match input.duplicate() {
                Some(copy) => (input, Some(Self::SingleUse(copy))),
                None => (input, None),
            },
        }
    }
}

impl FetchInput for String {
    fn into_descriptor(self) -> Descriptor<Self> {
        Descriptor::Reusable(self)
    }

    fn duplicate(&self) -> Option<Self> {
        Some(self.clone())
    }
}

impl<'a> FetchInput for &'a str {
    fn into_descriptor(self) -> Descriptor<Self> {
        Descriptor::Reusable(self)
    }

    fn duplicate(&self) -> Option<Self> {
        Some(*self)
    }
}

impl FetchInput for http::Uri {
    fn into_descriptor(self) -> Descriptor<Self> {
        Descriptor::Reusable(self)
    }

    fn duplicate(&self) -> Option<Self> {
        Some(self.clone())
    }
}

/// [`http::Request`] carries a body, so it classifies as single-use even
/// when the body type happens to be cheaply cloneable; the transport is
/// still handed ownership and consumes what it receives.
///
/// Duplication rebuilds the method, URI, version and headers and clones the
/// body. Request extensions are not carried over.
impl<B: Clone> FetchInput for http::Request<B> {
    fn into_descriptor(self) -> Descriptor<Self> {
        Descriptor::SingleUse(self)
    }

    fn duplicate(&self) -> Option<Self> {
        let mut builder = http::Request::builder()
            .method(self.method().clone())
            .uri(self.uri().clone())
            .version(self.version());
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in self.headers() {
                headers.append(name.clone(), value.clone());
            }
        }
        builder.body(self.body().clone()).ok()
    }
}

/// Duplication defers to [`reqwest::Request::try_clone`], which is `None`
/// for streaming bodies - exactly the case where a retry cannot re-send the
/// request.
#[cfg(feature = "reqwest")]
impl FetchInput for reqwest::Request {
    fn into_descriptor(self) -> Descriptor<Self> {
        Descriptor::SingleUse(self)
    }

    fn duplicate(&self) -> Option<Self> {
        self.try_clone()
    }
}
