//! The Basic Grayscale/Color Print Management SOP classes (PS3.4 Annex H,
//! spec.md §9 Design Notes, SPEC_FULL.md §4.7).
//!
//! A print session is a small tree: one Basic Film Session owns zero or more
//! Basic Film Boxes, each of which owns zero or more Basic Grayscale/Color
//! Image Boxes. N-ACTION "Print" (Action Type ID 1) on a Film Box spawns a
//! sibling Print Job. The tree lives only in memory for the lifetime of the
//! association that created it (spec.md §1 Non-goals: no persistence).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{self, Result};
use crate::uids::{self, PrintColorMode};

use super::dimse::connection::DimseConnection;
use super::dimse::normalized::{self, NResponder};

/// Picks the SOP Class UID of the Basic Film Session to create for a given
/// color mode, resolving the open question left by spec.md §9 ("createFilmSession's
/// sopClassUID is left unspecified"): it tracks the Print Management Meta SOP
/// Class the association negotiated, rather than a single hardcoded value.
pub fn select_print_sop_class_uid(color_mode: PrintColorMode) -> &'static str {
    color_mode.meta_sop_class_uid()
}

/// Generates SOP Instance UIDs for newly created print tree nodes. Scoped to
/// one process, monotonically increasing; good enough for the lifetime of a
/// single association, since the tree is never persisted.
fn next_instance_uid(root: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{root}.{n}")
}

/// An Image Box owned by a Film Box. `attributes` is the opaque dataset most
/// recently set on it via N-SET (spec.md §1: dataset contents are never
/// interpreted by this crate).
#[derive(Debug, Clone)]
pub struct ImageBox {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub attributes: Vec<u8>,
}

/// A Film Box owned by a Film Session.
#[derive(Debug, Clone)]
pub struct FilmBox {
    pub sop_instance_uid: String,
    pub attributes: Vec<u8>,
    pub image_boxes: BTreeMap<String, ImageBox>,
}

/// A Print Job created by an N-ACTION "Print" on a Film Box.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub sop_instance_uid: String,
    pub printer_sop_instance_uid: String,
    /// `PENDING`, `PRINTING`, `DONE` or `FAILURE` per PS3.3 C.13.9; this crate
    /// only ever leaves a freshly created job at `PENDING` and lets the
    /// caller drive further transitions via N-EVENT-REPORT.
    pub execution_status: &'static str,
}

/// A Basic Film Session and everything it owns.
#[derive(Debug, Clone)]
pub struct FilmSession {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub attributes: Vec<u8>,
    pub film_boxes: BTreeMap<String, FilmBox>,
}

/// The in-memory Print SOP tree for one association: at most one Printer,
/// any number of film sessions (in practice, Annex H expects exactly one
/// session per association, but nothing here enforces that), and the print
/// jobs they have spawned.
#[derive(Debug, Clone, Default)]
pub struct PrintManager {
    film_sessions: BTreeMap<String, FilmSession>,
    print_jobs: BTreeMap<String, PrintJob>,
}

impl PrintManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// N-CREATE on the Basic Film Session SOP Class.
    pub fn create_film_session(&mut self, color_mode: PrintColorMode, attributes: Vec<u8>) -> &FilmSession {
        let sop_class_uid = select_print_sop_class_uid(color_mode).to_string();
        let sop_instance_uid = next_instance_uid(uids::BASIC_FILM_SESSION);
        let session = FilmSession {
            sop_class_uid,
            sop_instance_uid: sop_instance_uid.clone(),
            attributes,
            film_boxes: BTreeMap::new(),
        };
        self.film_sessions.entry(sop_instance_uid.clone()).or_insert(session);
        self.film_sessions.get(&sop_instance_uid).expect("just inserted")
    }

    /// N-CREATE on the Basic Film Box SOP Class, as a child of `film_session_uid`.
    pub fn create_film_box(&mut self, film_session_uid: &str, attributes: Vec<u8>) -> Result<&FilmBox> {
        let session = self.film_sessions.get_mut(film_session_uid).ok_or_else(|| error::Error::ProtocolViolation {
            detail: format!("no film session with SOP Instance UID {film_session_uid}"),
        })?;
        let sop_instance_uid = next_instance_uid(uids::BASIC_FILM_BOX);
        let film_box = FilmBox {
            sop_instance_uid: sop_instance_uid.clone(),
            attributes,
            image_boxes: BTreeMap::new(),
        };
        session.film_boxes.insert(sop_instance_uid.clone(), film_box);
        Ok(session.film_boxes.get(&sop_instance_uid).expect("just inserted"))
    }

    fn find_film_box_mut(&mut self, film_box_uid: &str) -> Result<&mut FilmBox> {
        self.film_sessions
            .values_mut()
            .find_map(|session| session.film_boxes.get_mut(film_box_uid))
            .ok_or_else(|| error::Error::ProtocolViolation {
                detail: format!("no film box with SOP Instance UID {film_box_uid}"),
            })
    }

    /// N-CREATE on an Image Box SOP Class is not part of Annex H (Image
    /// Boxes are created implicitly alongside their Film Box, one per
    /// requested image display format); this populates that implicit set.
    pub fn add_image_box(&mut self, film_box_uid: &str, color_mode: PrintColorMode) -> Result<&ImageBox> {
        let sop_class_uid = color_mode.image_box_sop_class_uid().to_string();
        let sop_instance_uid = next_instance_uid(&sop_class_uid);
        let film_box = self.find_film_box_mut(film_box_uid)?;
        let image_box = ImageBox {
            sop_class_uid,
            sop_instance_uid: sop_instance_uid.clone(),
            attributes: Vec::new(),
        };
        film_box.image_boxes.insert(sop_instance_uid.clone(), image_box);
        Ok(film_box.image_boxes.get(&sop_instance_uid).expect("just inserted"))
    }

    /// N-SET on an Image Box: replaces its attribute list (e.g. Image
    /// Box Position, Basic Grayscale/Color Image Sequence) with the given
    /// opaque bytes.
    pub fn set_image_box(&mut self, image_box_uid: &str, attributes: Vec<u8>) -> Result<()> {
        for session in self.film_sessions.values_mut() {
            for film_box in session.film_boxes.values_mut() {
                if let Some(image_box) = film_box.image_boxes.get_mut(image_box_uid) {
                    image_box.attributes = attributes;
                    return Ok(());
                }
            }
        }
        Err(error::Error::ProtocolViolation {
            detail: format!("no image box with SOP Instance UID {image_box_uid}"),
        })
    }

    /// N-ACTION "Print" (Action Type ID 1) on a Film Box: spawns a Print Job
    /// that owns the film box's rendered content (spec.md §9, SPEC_FULL.md
    /// §4.7).
    pub fn print_film_box(&mut self, film_box_uid: &str) -> Result<&PrintJob> {
        // Validate the film box exists before minting a job for it.
        self.find_film_box_mut(film_box_uid)?;
        let printer_sop_instance_uid = uids::PRINTER.to_string();
        let sop_instance_uid = next_instance_uid(uids::PRINT_JOB);
        let job = PrintJob {
            sop_instance_uid: sop_instance_uid.clone(),
            printer_sop_instance_uid,
            execution_status: "PENDING",
        };
        self.print_jobs.insert(sop_instance_uid.clone(), job);
        Ok(self.print_jobs.get(&sop_instance_uid).expect("just inserted"))
    }

    pub fn print_job(&self, sop_instance_uid: &str) -> Option<&PrintJob> {
        self.print_jobs.get(sop_instance_uid)
    }

    /// N-DELETE on a Basic Film Session: removes it and every Film Box/Image
    /// Box it owns. Deleting an already-absent session is not an error
    /// (N-DELETE is idempotent per spec.md §4.5).
    pub fn delete_film_session(&mut self, film_session_uid: &str) {
        self.film_sessions.remove(film_session_uid);
    }

    /// N-DELETE on a Basic Film Box: removes it and its image boxes, without
    /// touching the owning film session.
    pub fn delete_film_box(&mut self, film_box_uid: &str) {
        for session in self.film_sessions.values_mut() {
            session.film_boxes.remove(film_box_uid);
        }
    }

    pub fn film_session(&self, sop_instance_uid: &str) -> Option<&FilmSession> {
        self.film_sessions.get(sop_instance_uid)
    }
}

/// Action Type ID for N-ACTION "Print" on a Basic Film Box or Film Session
/// (PS3.4 Annex H.4.1.1.4).
pub const ACTION_TYPE_ID_PRINT: u16 = 1;

/// Requestor-side convenience wrapper driving a whole print workflow over an
/// established association: open a film session, create one film box with
/// its image boxes, fill each image box, print, then tear the session down
/// (spec.md §8 Scenario F).
#[allow(clippy::too_many_arguments)]
pub fn print_basic_film(
    conn: &mut impl DimseConnection,
    context_id: u8,
    next_message_id: &mut u16,
    color_mode: PrintColorMode,
    film_session_attributes: &[u8],
    film_box_attributes: &[u8],
    image_box_datasets: &[&[u8]],
) -> Result<u16> {
    let mut id = || {
        *next_message_id += 1;
        *next_message_id
    };

    let sop_class_uid = select_print_sop_class_uid(color_mode);

    let session = normalized::n_create(
        conn,
        context_id,
        id(),
        sop_class_uid,
        None,
        Some(film_session_attributes),
    )?;
    let session_uid = session.affected_sop_instance_uid.ok_or_else(|| error::Error::ProtocolViolation {
        detail: "N-CREATE-RSP for Basic Film Session did not return a SOP Instance UID".to_string(),
    })?;

    let film_box = normalized::n_create(
        conn,
        context_id,
        id(),
        uids::BASIC_FILM_BOX,
        None,
        Some(film_box_attributes),
    )?;
    let film_box_uid = film_box.affected_sop_instance_uid.ok_or_else(|| error::Error::ProtocolViolation {
        detail: "N-CREATE-RSP for Basic Film Box did not return a SOP Instance UID".to_string(),
    })?;

    for dataset in image_box_datasets {
        normalized::n_set(
            conn,
            context_id,
            id(),
            color_mode.image_box_sop_class_uid(),
            &film_box_uid,
            dataset,
        )?;
    }

    let printed = normalized::n_action(
        conn,
        context_id,
        id(),
        uids::BASIC_FILM_BOX,
        &film_box_uid,
        ACTION_TYPE_ID_PRINT,
        None,
    )?;

    normalized::n_delete(conn, context_id, id(), sop_class_uid, &session_uid)?;

    Ok(printed.status)
}

/// Acceptor-side dispatch for a single N-service request against a
/// [`PrintManager`]. Call this in a loop driven by whatever distinguishes
/// N-service command fields at the association layer; it replies on `conn`
/// itself and never blocks past that single request/response pair.
pub struct PrintScp {
    pub manager: PrintManager,
}

impl PrintScp {
    pub fn new() -> Self {
        PrintScp { manager: PrintManager::new() }
    }

    /// Handle an N-CREATE-RQ for a Basic Film Session, replying with the
    /// assigned SOP Instance UID.
    pub fn handle_create_film_session(
        &mut self,
        conn: &mut impl DimseConnection,
        context_id: u8,
        message_id_being_responded_to: u16,
        color_mode: PrintColorMode,
        attributes: Vec<u8>,
    ) -> Result<()> {
        let session = self.manager.create_film_session(color_mode, attributes);
        let sop_class_uid = session.sop_class_uid.clone();
        let sop_instance_uid = session.sop_instance_uid.clone();
        NResponder::n_create(conn, context_id, message_id_being_responded_to, &sop_class_uid, &sop_instance_uid, 0x0000, None)
    }

    /// Handle an N-ACTION-RQ invoking "Print" on a Film Box, replying with
    /// the newly created Print Job's SOP Instance UID.
    pub fn handle_print(
        &mut self,
        conn: &mut impl DimseConnection,
        context_id: u8,
        message_id_being_responded_to: u16,
        film_box_uid: &str,
    ) -> Result<()> {
        match self.manager.print_film_box(film_box_uid) {
            Ok(job) => {
                let job_uid = job.sop_instance_uid.clone();
                NResponder::n_action(
                    conn,
                    context_id,
                    message_id_being_responded_to,
                    uids::PRINT_JOB,
                    &job_uid,
                    ACTION_TYPE_ID_PRINT,
                    0x0000,
                    None,
                )
            }
            Err(_) => NResponder::n_action(
                conn,
                context_id,
                message_id_being_responded_to,
                uids::BASIC_FILM_BOX,
                film_box_uid,
                ACTION_TYPE_ID_PRINT,
                0xC000,
                None,
            ),
        }
    }

    /// Handle an N-DELETE-RQ against a Basic Film Session.
    pub fn handle_delete_film_session(
        &mut self,
        conn: &mut impl DimseConnection,
        context_id: u8,
        message_id_being_responded_to: u16,
        sop_class_uid: &str,
        film_session_uid: &str,
    ) -> Result<()> {
        self.manager.delete_film_session(film_session_uid);
        NResponder::n_delete(conn, context_id, message_id_being_responded_to, sop_class_uid, film_session_uid, 0x0000)
    }
}

impl Default for PrintScp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn film_session_tree_builds_and_cascades_delete() {
        let mut mgr = PrintManager::new();
        let session = mgr.create_film_session(PrintColorMode::Grayscale, vec![1, 2, 3]);
        let session_uid = session.sop_instance_uid.clone();
        assert_eq!(session.sop_class_uid, uids::BASIC_GRAYSCALE_PRINT_MANAGEMENT_META);

        let film_box_uid = mgr.create_film_box(&session_uid, vec![4, 5]).unwrap().sop_instance_uid.clone();
        let image_box_uid = mgr
            .add_image_box(&film_box_uid, PrintColorMode::Grayscale)
            .unwrap()
            .sop_instance_uid
            .clone();

        mgr.set_image_box(&image_box_uid, vec![9, 9, 9]).unwrap();
        assert_eq!(
            mgr.film_session(&session_uid).unwrap().film_boxes[&film_box_uid].image_boxes[&image_box_uid].attributes,
            vec![9, 9, 9]
        );

        let job_uid = mgr.print_film_box(&film_box_uid).unwrap().sop_instance_uid.clone();
        assert_eq!(mgr.print_job(&job_uid).unwrap().execution_status, "PENDING");

        mgr.delete_film_session(&session_uid);
        assert!(mgr.film_session(&session_uid).is_none());
    }

    #[test]
    fn print_unknown_film_box_fails() {
        let mut mgr = PrintManager::new();
        assert!(mgr.print_film_box("9.9.9.9").is_err());
    }

    #[test]
    fn color_mode_selects_distinct_sop_classes() {
        assert_eq!(select_print_sop_class_uid(PrintColorMode::Grayscale), uids::BASIC_GRAYSCALE_PRINT_MANAGEMENT_META);
        assert_eq!(select_print_sop_class_uid(PrintColorMode::Color), uids::BASIC_COLOR_PRINT_MANAGEMENT_META);
    }
}
