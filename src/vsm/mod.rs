//! Vector space model
//!
//! Sparse term vectors, the clusters that own them, and the incremental
//! clustering engine that groups a document stream into topics.

pub mod cluster;
pub mod clustering;
pub mod math;
pub mod vector;

pub use cluster::{Cluster, ClusterId, ClusterRecord, ClusterState, CLUSTER_SCHEMA_VERSION};
pub use clustering::{ClusteringConfig, ClusteringEngine, FreezePolicy};
pub use math::{cosine, Dimensions};
pub use vector::{Vector, VECTOR_SCHEMA_VERSION};
