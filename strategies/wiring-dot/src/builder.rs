use crate::{DotStrategy, RankDirection};

pub struct DotStrategyBuilder {
    rank_direction: RankDirection,
    show_inherited: bool,
    cluster_subcomponents: bool,
}
impl Default for DotStrategyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
impl DotStrategyBuilder {
    pub fn new() -> DotStrategyBuilder {
        DotStrategyBuilder {
            rank_direction: RankDirection::TopToBottom,
            show_inherited: false,
            cluster_subcomponents: true,
        }
    }

    /// Direction dependency edges point in
    pub fn rank_direction(mut self, rank_direction: RankDirection) -> Self {
        self.rank_direction = rank_direction;
        self
    }

    /// Also draw the entries a subcomponent only reuses from an ancestor.
    ///
    /// When hidden, edges to such keys point at the node of the ancestor resolving them.
    pub fn show_inherited(mut self, show_inherited: bool) -> Self {
        self.show_inherited = show_inherited;
        self
    }

    /// Nest subcomponent clusters inside their parent's cluster instead of drawing
    /// every component side by side
    pub fn cluster_subcomponents(mut self, cluster_subcomponents: bool) -> Self {
        self.cluster_subcomponents = cluster_subcomponents;
        self
    }

    pub fn build(self) -> DotStrategy {
        DotStrategy {
            rank_direction: self.rank_direction,
            show_inherited: self.show_inherited,
            cluster_subcomponents: self.cluster_subcomponents,
        }
    }
}
