pub mod cell;
pub mod cell_id;
pub mod dep_graph;
pub mod events;
pub mod formula;
pub mod grid;
pub mod history;
