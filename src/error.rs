use thiserror::Error;

/// Rejected user input. Always raised before anything is fetched.
#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("Latitude {0} is outside of [-90, 90]")]
    Latitude(f64),
    #[error("Longitude {0} is outside of [-180, 180]")]
    Longitude(f64),
    #[error("Buffer must be a positive number of degrees, got {0}")]
    Buffer(f64),
    #[error("Invalid date '{0}', expected dd:mm:yy")]
    Date(String),
    #[error("Start date {start} is after end date {end}")]
    DateOrder { start: String, end: String },
    #[error("Maximum time difference must not be negative, got {0} minutes")]
    MaxTimeDelta(i64),
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum ProjectionError {
    #[error("Coordinate ({lon}, {lat}) cannot be projected into EPSG:{epsg}")]
    OutOfDomain { lon: f64, lat: f64, epsg: u32 },
}

/// Reasons an overlap between two footprints could not be computed.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum OverlapError {
    #[error("Footprint is empty")]
    Empty,
    #[error("Footprint contains non-finite coordinates")]
    NonFinite,
    #[error("Reference footprint has zero area")]
    ZeroArea,
    #[error("Footprints are malformed, intersection covers {0}% of the reference")]
    InvalidGeometry(f64),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog credentials are missing, set a client id and secret")]
    MissingCredentials,
    #[error("Catalog responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Token response did not contain an access token")]
    MissingAccessToken,
    #[error("Unable to decode catalog item '{id}': {reason}")]
    InvalidItem { id: String, reason: String },
}
