//! Callbacks from control points into their owning network.
//!
//! A point holds only a weak link to the network. The network owns the
//! points, builds its graph from these callbacks, and answers the one query a
//! point needs ([`ControlNetwork::coord_type`]).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use control_net_core::CoordinateType;

use crate::{ControlMeasure, ControlPoint, PointType};

/// Shared handle to a network.
pub type NetworkHandle = Rc<RefCell<dyn ControlNetwork>>;

pub(crate) type NetworkLink = Weak<RefCell<dyn ControlNetwork>>;

/// What changed on a point.
#[derive(Clone, Debug, PartialEq)]
pub enum PointModification {
    EditLock { old: bool, new: bool },
    Ignored { old: bool, new: bool },
    Rejected { old: bool, new: bool },
    Type { old: PointType, new: PointType },
}

/// What changed on a measure.
#[derive(Clone, Debug, PartialEq)]
pub enum MeasureModification {
    Ignored { old: bool, new: bool },
}

/// Receiver of point and measure notifications.
///
/// Callbacks run synchronously while the point is mid-mutation. They must not
/// call back into the same point.
pub trait ControlNetwork {
    fn measure_added(&mut self, measure: &ControlMeasure);

    /// Called before the measure is removed from its point.
    fn measure_deleted(&mut self, measure: &ControlMeasure);

    fn measure_modified(&mut self, measure: &ControlMeasure, change: MeasureModification);

    fn measure_ignored(&mut self, measure: &ControlMeasure);

    fn measure_un_ignored(&mut self, measure: &ControlMeasure);

    fn point_modified(&mut self, point: &ControlPoint, change: PointModification);

    fn point_ignored(&mut self, point: &ControlPoint);

    fn point_un_ignored(&mut self, point: &ControlPoint);

    /// The point was renamed from `old_id`.
    fn update_point_reference(&mut self, point: &ControlPoint, old_id: &str);

    fn network_structure_modified(&mut self);

    /// Coordinate system that a-priori sigmas are interpreted in.
    fn coord_type(&self) -> CoordinateType {
        CoordinateType::Latitudinal
    }
}

/// Run `f` against the network behind `link`, if any.
///
/// Returns `None` when detached or when the network is already borrowed
/// (a re-entrant callback); the latter is logged and dropped.
pub(crate) fn with_network<R>(
    link: Option<&NetworkLink>,
    f: impl FnOnce(&mut dyn ControlNetwork) -> R,
) -> Option<R> {
    let network = link?.upgrade()?;
    let result = match network.try_borrow_mut() {
        Ok(mut net) => Some(f(&mut *net)),
        Err(_) => {
            log::warn!("control network is busy, dropping re-entrant notification");
            None
        }
    };
    result
}
