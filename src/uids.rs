//! Well-known UIDs used by the upper layer protocol and the DIMSE services
//! built on top of it.
//!
//! `dicom-dictionary-std` only catalogs the command-set tag dictionary that
//! this crate depends on; it does not enumerate transfer syntaxes or SOP
//! classes. Those are reproduced here directly, narrowly scoped to the UIDs
//! this crate's negotiation and print SOP tree logic actually compare
//! against.

/// DICOM UL application context name, always proposed in an A-ASSOCIATE-RQ.
pub const APPLICATION_CONTEXT_NAME: &str = "1.2.840.10008.3.1.1.1";

/// Verification SOP Class (C-ECHO).
pub const VERIFICATION: &str = "1.2.840.10008.1.1";

/// Implicit VR Little Endian transfer syntax.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";

/// Explicit VR Little Endian transfer syntax.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// Explicit VR Big Endian transfer syntax (retired).
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";

/// Modality Worklist Information Model - FIND.
pub const MODALITY_WORKLIST_FIND: &str = "1.2.840.10008.5.1.4.31";

/// Modality Performed Procedure Step SOP Class.
pub const MODALITY_PERFORMED_PROCEDURE_STEP: &str = "1.2.840.10008.3.1.2.3.3";

/// Study Root Query/Retrieve Information Model - FIND.
pub const STUDY_ROOT_QUERY_RETRIEVE_FIND: &str = "1.2.840.10008.5.1.4.1.2.2.1";

/// Study Root Query/Retrieve Information Model - MOVE.
pub const STUDY_ROOT_QUERY_RETRIEVE_MOVE: &str = "1.2.840.10008.5.1.4.1.2.2.2";

/// Study Root Query/Retrieve Information Model - GET.
pub const STUDY_ROOT_QUERY_RETRIEVE_GET: &str = "1.2.840.10008.5.1.4.1.2.2.3";

/// Patient Root Query/Retrieve Information Model - FIND.
pub const PATIENT_ROOT_QUERY_RETRIEVE_FIND: &str = "1.2.840.10008.5.1.4.1.2.1.1";

/// Patient Root Query/Retrieve Information Model - MOVE.
pub const PATIENT_ROOT_QUERY_RETRIEVE_MOVE: &str = "1.2.840.10008.5.1.4.1.2.1.2";

/// Patient Root Query/Retrieve Information Model - GET.
pub const PATIENT_ROOT_QUERY_RETRIEVE_GET: &str = "1.2.840.10008.5.1.4.1.2.1.3";

/// Basic Grayscale Print Management Meta SOP Class.
pub const BASIC_GRAYSCALE_PRINT_MANAGEMENT_META: &str = "1.2.840.10008.5.1.1.9";

/// Basic Color Print Management Meta SOP Class.
pub const BASIC_COLOR_PRINT_MANAGEMENT_META: &str = "1.2.840.10008.5.1.1.18";

/// Basic Film Session SOP Class.
pub const BASIC_FILM_SESSION: &str = "1.2.840.10008.5.1.1.1";

/// Basic Film Box SOP Class.
pub const BASIC_FILM_BOX: &str = "1.2.840.10008.5.1.1.2";

/// Basic Grayscale Image Box SOP Class.
pub const BASIC_GRAYSCALE_IMAGE_BOX: &str = "1.2.840.10008.5.1.1.4";

/// Basic Color Image Box SOP Class.
pub const BASIC_COLOR_IMAGE_BOX: &str = "1.2.840.10008.5.1.1.4.1";

/// Printer SOP Class.
pub const PRINTER: &str = "1.2.840.10008.5.1.1.16";

/// Print Job SOP Class.
pub const PRINT_JOB: &str = "1.2.840.10008.5.1.1.14";

/// The color mode of a requested print session, used to resolve the SOP
/// Class UID of a Basic Film Session that the caller did not pin down
/// explicitly (see [`crate::print::select_print_sop_class_uid`]).
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum PrintColorMode {
    Grayscale,
    Color,
}

impl PrintColorMode {
    /// The Print Management Meta SOP Class UID that governs a film session
    /// opened in this color mode.
    pub fn meta_sop_class_uid(self) -> &'static str {
        match self {
            PrintColorMode::Grayscale => BASIC_GRAYSCALE_PRINT_MANAGEMENT_META,
            PrintColorMode::Color => BASIC_COLOR_PRINT_MANAGEMENT_META,
        }
    }

    /// The Image Box SOP Class UID used by film boxes opened in this color
    /// mode.
    pub fn image_box_sop_class_uid(self) -> &'static str {
        match self {
            PrintColorMode::Grayscale => BASIC_GRAYSCALE_IMAGE_BOX,
            PrintColorMode::Color => BASIC_COLOR_IMAGE_BOX,
        }
    }
}
