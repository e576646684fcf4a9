pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod rpc;
pub mod session;
pub mod sync;
pub mod workflow;
pub mod geometry {
    pub mod connector;
    pub mod limits;
    pub mod ports;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod navigation;
    pub mod patch;
    pub mod selection;
    pub mod spatial_hash;
}

pub use algorithms::navigation::{navigate, NavigationHit, NavigationStage, Navigator, NavigatorEvent, NavigatorState, PendingMove};
pub use algorithms::patch::{apply_patch, Operation, PathPrefix};
pub use algorithms::selection::{find_nodes_inside_of_rectangle, RectangleSelection};
pub use algorithms::spatial_hash::{build_spatial_hash, query_nearby_objects, CanvasIndex, SpatialHash};
pub use config::{CanvasConfig, TeardownPolicy};
pub use error::{Error, Result};
pub use event::{parse_message, Inbound, WorkflowPatch};
pub use geometry::connector::{connector_path, ConnectorCurve, ConnectorGeometry};
pub use geometry::ports::{port_shift, PortGeometry};
pub use model::{Bounds, Connection, ConnectorEndpoint, Direction, ObjectKind, Point, PortSide, PositionedObject};
pub use rpc::{RpcCall, RpcClient, Transport};
pub use session::WorkflowSession;
pub use sync::{PatchWait, SnapshotSync};
