//! Core rewrite loop
//!
//! [`PassManager`] drives rewrite rules and whole-graph passes over a graph
//! until nothing changes or the iteration bound is hit.

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, debug_span, trace, warn};

use crate::error::{RewriteError, RewriteResult};
use crate::graph::{Graph, NodeId};
use crate::traits::GraphPass;

use super::rule::{RewriteRule, RuleOutcome};

/// Pass manager configuration
#[derive(Debug, Clone)]
pub struct PassConfig {
    /// Maximum sweeps before giving up on convergence
    pub max_iterations: usize,
    /// Whether to continue after a non-structural rule error
    pub continue_on_error: bool,
    /// Whether to validate the graph after every replacement
    pub validate_after_rewrite: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            continue_on_error: true,
            validate_after_rewrite: true,
        }
    }
}

impl PassConfig {
    /// Set the iteration bound
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the error policy
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Enable or disable post-replacement validation
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_after_rewrite = validate;
        self
    }
}

/// Lifecycle of one pass-manager run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    /// Not started
    #[default]
    Scheduled,
    /// Sweeping
    Running,
    /// An iteration made no change
    Converged,
    /// `max_iterations` reached while still changing
    BoundExceeded,
}

/// A rule or pass attempt that failed and was rolled back
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    /// Rule or pass name
    pub rule: String,
    /// Node the rule was applied at, `None` for whole-graph passes
    pub node: Option<NodeId>,
    /// The error
    pub error: RewriteError,
}

/// Statistics from a pass-manager run
#[derive(Debug, Default, Clone)]
pub struct PassReport {
    /// Final state
    pub state: PassState,
    /// Number of iterations performed
    pub iterations: usize,
    /// Number of rewrites applied
    pub rewrites_applied: usize,
    /// Number of matches whose callback declined
    pub matches_declined: usize,
    /// Rewrites applied per rule
    pub per_rule: IndexMap<String, usize>,
    /// Iterations in which each whole-graph pass changed the graph
    pub pass_changes: IndexMap<String, usize>,
    /// Rolled-back failures
    pub failures: Vec<RuleFailure>,
}

impl PassReport {
    /// Whether anything changed
    pub fn changed(&self) -> bool {
        self.rewrites_applied > 0 || self.pass_changes.values().any(|&n| n > 0)
    }

    /// Whether the run reached a fixed point
    pub fn converged(&self) -> bool {
        self.state == PassState::Converged
    }

    /// Rewrites applied by one rule
    pub fn applied(&self, rule: &str) -> usize {
        self.per_rule.get(rule).copied().unwrap_or(0)
    }
}

/// Main rewrite engine
///
/// Each iteration walks a snapshot of the reverse topological order
/// (consumers before producers). At every node still alive, rules are tried
/// in registration order and the first one that applies ends that node's
/// turn. Whole-graph passes then run in registration order.
#[derive(Default)]
pub struct PassManager {
    config: PassConfig,
    rules: Vec<RewriteRule>,
    passes: Vec<Box<dyn GraphPass>>,
}

impl PassManager {
    /// Create an empty pass manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the manager
    pub fn with_config(mut self, config: PassConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    /// Append a rule
    pub fn register_rule(&mut self, rule: RewriteRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Builder-style [`register_rule`](Self::register_rule)
    pub fn add_rule(mut self, rule: RewriteRule) -> Self {
        self.register_rule(rule);
        self
    }

    /// Append a whole-graph pass
    pub fn register_pass<P: GraphPass + 'static>(&mut self, pass: P) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Builder-style [`register_pass`](Self::register_pass)
    pub fn add_pass<P: GraphPass + 'static>(mut self, pass: P) -> Self {
        self.register_pass(pass);
        self
    }

    /// Registered rules, in order
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Names of registered passes, in order
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run to a fixed point or the iteration bound
    ///
    /// Structural errors abort the run. Other errors abort only the failing
    /// attempt (which is rolled back) unless `continue_on_error` is off.
    pub fn run(&self, graph: &mut Graph) -> RewriteResult<PassReport> {
        let span = debug_span!(
            "pass_manager",
            rules = self.rules.len(),
            passes = self.passes.len()
        );
        let _enter = span.enter();

        let previous = graph.validation_enabled();
        graph.set_validation(self.config.validate_after_rewrite);
        let result = self.drive(graph);
        graph.set_validation(previous);
        result
    }

    /// Run one pipeline per graph on the rayon pool
    pub fn run_parallel(&self, graphs: &mut [Graph]) -> Vec<RewriteResult<PassReport>> {
        graphs.par_iter_mut().map(|graph| self.run(graph)).collect()
    }

    fn drive(&self, graph: &mut Graph) -> RewriteResult<PassReport> {
        let mut report = PassReport {
            state: PassState::Running,
            ..Default::default()
        };

        while report.iterations < self.config.max_iterations {
            report.iterations += 1;
            let mut changed = self.sweep_rules(graph, &mut report)?;
            changed |= self.run_passes(graph, &mut report)?;

            if !changed {
                report.state = PassState::Converged;
                debug!(
                    iterations = report.iterations,
                    rewrites = report.rewrites_applied,
                    "converged"
                );
                return Ok(report);
            }
        }

        report.state = PassState::BoundExceeded;
        warn!(
            max_iterations = self.config.max_iterations,
            rewrites = report.rewrites_applied,
            "iteration bound reached before convergence"
        );
        Ok(report)
    }

    fn sweep_rules(&self, graph: &mut Graph, report: &mut PassReport) -> RewriteResult<bool> {
        if self.rules.is_empty() {
            return Ok(false);
        }

        let mut changed = false;
        for id in graph.reverse_topological_order() {
            if !graph.contains(id) {
                continue;
            }

            for rule in &self.rules {
                match rule.apply(graph, id) {
                    Ok(RuleOutcome::Applied) => {
                        debug!(rule = rule.name(), node = %id, "rule applied");
                        report.rewrites_applied += 1;
                        *report.per_rule.entry(rule.name().to_string()).or_insert(0) += 1;
                        changed = true;
                        break;
                    }
                    Ok(RuleOutcome::Declined) => {
                        trace!(rule = rule.name(), node = %id, "rule declined");
                        report.matches_declined += 1;
                    }
                    Ok(RuleOutcome::NoMatch) => {}
                    Err(error) => self.handle_failure(rule.name(), Some(id), error, report)?,
                }
            }
        }

        Ok(changed)
    }

    fn run_passes(&self, graph: &mut Graph, report: &mut PassReport) -> RewriteResult<bool> {
        let mut changed = false;
        for pass in &self.passes {
            if !pass.is_applicable(graph) {
                continue;
            }

            match graph.transaction(|g| pass.run(g)) {
                Ok(true) => {
                    debug!(pass = pass.name(), "pass changed graph");
                    *report.pass_changes.entry(pass.name().to_string()).or_insert(0) += 1;
                    changed = true;
                }
                Ok(false) => {}
                Err(error) => self.handle_failure(pass.name(), None, error, report)?,
            }
        }
        Ok(changed)
    }

    fn handle_failure(
        &self,
        name: &str,
        node: Option<NodeId>,
        error: RewriteError,
        report: &mut PassReport,
    ) -> RewriteResult<()> {
        if error.is_structural() || !self.config.continue_on_error {
            return Err(error);
        }

        warn!(rule = name, node = ?node, error = %error, "rewrite failed, rolled back");
        report.failures.push(RuleFailure {
            rule: name.to_string(),
            node,
            error,
        });
        Ok(())
    }
}

/// Single sweep: apply `rule` once at every matching node
///
/// Returns the number of rewrites applied.
pub fn rewrite_once(graph: &mut Graph, rule: &RewriteRule) -> RewriteResult<usize> {
    let mut applied = 0;
    for id in graph.reverse_topological_order() {
        if graph.contains(id) && rule.apply(graph, id)? == RuleOutcome::Applied {
            applied += 1;
        }
    }
    Ok(applied)
}

/// Sweep with `rule` until nothing changes
pub fn rewrite_until_fixed_point(
    graph: &mut Graph,
    rule: &RewriteRule,
    max_iterations: usize,
) -> RewriteResult<usize> {
    let mut total = 0;

    for _ in 0..max_iterations {
        let applied = rewrite_once(graph, rule)?;
        if applied == 0 {
            break;
        }
        total += applied;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralError;
    use crate::opset::{Attributes, OpKind};
    use crate::pattern::PatternBuilder;
    use crate::tensor::{ElementType, TensorDesc};

    // x -> Exp -> Exp -> out
    fn exp_chain() -> Graph {
        let mut graph = Graph::new();
        let x = graph
            .add_parameter("x", TensorDesc::new(ElementType::F32, &[4]))
            .unwrap();
        let a = graph.add_node(OpKind::Exp, &[x.output(0)], Attributes::new()).unwrap();
        let b = graph.add_node(OpKind::Exp, &[a.output(0)], Attributes::new()).unwrap();
        graph.add_result("out", b.output(0)).unwrap();
        graph
    }

    fn unary_rule(name: &'static str, from: OpKind, to: OpKind) -> RewriteRule {
        let mut p = PatternBuilder::new();
        let x = p.any();
        let root = p.op(from, [x]);
        RewriteRule::new(name, p.build(root), move |g, m| {
            let source = g
                .producer_of(m.root(), 0)
                .ok_or(RewriteError::UnknownNode(m.root()))?;
            let new = g.add_node(to, &[source], Attributes::new())?;
            g.replace_node(m.root(), &[new.output(0)])?;
            Ok(true)
        })
    }

    #[test]
    fn test_run_converges() {
        let mut graph = exp_chain();
        let manager = PassManager::new().add_rule(unary_rule("ExpToTanh", OpKind::Exp, OpKind::Tanh));

        let report = manager.run(&mut graph).unwrap();
        assert_eq!(report.state, PassState::Converged);
        assert_eq!(report.rewrites_applied, 2);
        assert_eq!(report.applied("ExpToTanh"), 2);
        assert_eq!(report.iterations, 2);
        assert!(graph.find_nodes_by_kind(OpKind::Exp).is_empty());
    }

    #[test]
    fn test_run_is_idempotent() {
        let mut graph = exp_chain();
        let manager = PassManager::new().add_rule(unary_rule("ExpToTanh", OpKind::Exp, OpKind::Tanh));
        manager.run(&mut graph).unwrap();
        let converged = graph.clone();

        let report = manager.run(&mut graph).unwrap();
        assert_eq!(report.iterations, 1);
        assert!(!report.changed());
        assert_eq!(graph, converged);
    }

    #[test]
    fn test_bound_exceeded() {
        let mut graph = exp_chain();
        let manager = PassManager::new()
            .with_config(PassConfig::default().with_max_iterations(3))
            .add_rule(unary_rule("ExpToTanh", OpKind::Exp, OpKind::Tanh))
            .add_rule(unary_rule("TanhToExp", OpKind::Tanh, OpKind::Exp));

        let report = manager.run(&mut graph).unwrap();
        assert_eq!(report.state, PassState::BoundExceeded);
        assert_eq!(report.iterations, 3);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_failures_are_recorded() {
        let mut graph = exp_chain();
        let mut p = PatternBuilder::new();
        let root = p.wrap_type(OpKind::Exp);
        let broken = RewriteRule::new("Broken", p.build(root), |g, m| {
            g.replace_node(m.root(), &[])?;
            Ok(true)
        });
        let before = graph.clone();

        let report = PassManager::new().add_rule(broken.clone()).run(&mut graph).unwrap();
        assert_eq!(report.failures.len(), 2);
        assert!(report.converged());
        assert_eq!(graph, before);

        let strict = PassManager::new()
            .with_config(PassConfig::default().with_continue_on_error(false))
            .add_rule(broken);
        assert!(matches!(
            strict.run(&mut graph),
            Err(RewriteError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_structural_error_aborts() {
        let mut graph = exp_chain();
        let mut p = PatternBuilder::new();
        let root = p.wrap_type(OpKind::Exp);
        let cyclic = RewriteRule::new("Cyclic", p.build(root), |g, m| {
            let consumer = g.consumers(m.root().output(0))[0].node;
            if g.node(consumer).map(|n| n.kind()) != Some(OpKind::Exp) {
                return Ok(false);
            }
            g.replace_node(m.root(), &[consumer.output(0)])?;
            Ok(true)
        });
        let before = graph.clone();

        let result = PassManager::new().add_rule(cyclic).run(&mut graph);
        assert!(matches!(
            result,
            Err(RewriteError::Structural(StructuralError::Cycle { .. }))
        ));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_rewrite_once() {
        let mut graph = exp_chain();
        let rule = unary_rule("ExpToLog", OpKind::Exp, OpKind::Log);
        assert_eq!(rewrite_once(&mut graph, &rule).unwrap(), 2);
        assert_eq!(rewrite_until_fixed_point(&mut graph, &rule, 5).unwrap(), 0);
    }

    #[test]
    fn test_run_parallel() {
        let mut graphs = vec![exp_chain(), exp_chain(), exp_chain()];
        let manager = PassManager::new().add_rule(unary_rule("ExpToTanh", OpKind::Exp, OpKind::Tanh));

        let reports = manager.run_parallel(&mut graphs);
        assert_eq!(reports.len(), 3);
        for report in reports {
            assert_eq!(report.unwrap().rewrites_applied, 2);
        }
        assert!(graphs.iter().all(|g| g.find_nodes_by_kind(OpKind::Exp).is_empty()));
    }
}
