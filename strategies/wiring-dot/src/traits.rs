use thiserror::Error;
use wiring_graph::BindingGraph;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to format the rendered graph: {0}")]
    Format(#[from] std::fmt::Error),
    #[error("Failed to write the rendered graph: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a finished binding graph into some output, e.g. a diagram or generated code.
///
/// Is implemented for any function taking a [BindingGraph] and returning a [Result]
pub trait GraphStrategy {
    type Output;

    fn render(&self, graph: &BindingGraph) -> Result<Self::Output, RenderError>;
}
/// Any function over a graph can be used as a strategy
impl<Fun, Output> GraphStrategy for Fun
where
    Fun: Fn(&BindingGraph) -> Result<Output, RenderError>,
{
    type Output = Output;

    fn render(&self, graph: &BindingGraph) -> Result<Output, RenderError> {
        self(graph)
    }
}
