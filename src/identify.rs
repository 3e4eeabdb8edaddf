use std::fmt;

use crate::error::Error;
use crate::history::HistoryStore;
use crate::model::AttributeRecord;
use crate::source_image::SourceImage;

/// Why an identification service could not produce a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentifyError {
    /// The photo did not show a recognisable plant.
    UnclearImage,
    Upstream(String),
}

impl fmt::Display for IdentifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifyError::UnclearImage => {
                write!(f, "the image is unclear; try a sharper photo of a single plant")
            }
            IdentifyError::Upstream(msg) => write!(f, "upstream service error: {msg}"),
        }
    }
}

impl std::error::Error for IdentifyError {}

/// An image-understanding service that turns a photo into attributes.
pub trait Identify {
    fn identify(&self, image: &SourceImage) -> Result<AttributeRecord, IdentifyError>;
}

impl<F> Identify for F
where
    F: Fn(&SourceImage) -> Result<AttributeRecord, IdentifyError>,
{
    fn identify(&self, image: &SourceImage) -> Result<AttributeRecord, IdentifyError> {
        self(image)
    }
}

/// Identify `image` and, on success, record the result in `history`.
/// A history that cannot be written does not fail the identification.
pub fn identify_and_remember(
    identifier: &dyn Identify,
    image: &SourceImage,
    history: &mut HistoryStore,
) -> Result<AttributeRecord, Error> {
    if image.is_empty() {
        return Err(Error::MissingInput("image"));
    }
    let record = identifier.identify(image).map_err(|e| {
        log::warn!("identification failed: {e}");
        Error::Identification(e)
    })?;
    if record.common_name.trim().is_empty() {
        return Err(Error::InvalidRecord("identification returned no common name".into()));
    }
    if let Err(e) = history.add(image, &record) {
        log::warn!("could not remember {:?}: {e}", record.common_name);
    }
    Ok(record)
}
