//! Definition entry points and the definer handles passed to callbacks
//!
//! # Example
//!
//! ```rust,ignore
//! define_feature(&mut host, &feature, |scenarios| {
//!     scenarios.test("Buying a snack", |steps| {
//!         steps.given(StepMatcher::pattern(r"^I have (\d+) coins$")?, |ctx| async move {
//!             let coins: u32 = ctx.parse_arg(0)?;
//!             anyhow::ensure!(coins > 0);
//!             Ok(())
//!         })?;
//!         steps.when("I select \"Mars\"", |_ctx| async { Ok(()) })?;
//!         Ok(())
//!     })
//! })?;
//! ```

use crate::context::{step_fn, StepContext, StepFn, StepResult};
use crate::driver::{probe_pending, run_scenario};
use crate::error::{BindError, BindResult};
use crate::host::{HostRunner, TestMode};
use crate::matcher::StepMatcher;
use crate::registry::{bind_step, StepBinding};
use crate::resolver::{GroupRef, GroupSession, ScenarioKey};
use crate::state::ScenarioState;
use crate::validation::{check_group, check_rules, check_scenario_steps};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use stepbind_model::{Feature, ScenarioNameVars};
use stepbind_tags::TagFilterCache;
use tracing::{debug, info, warn};

/// Bind a feature's scenarios and register them with `host`
///
/// Rules are folded into the feature first when `collapse_rules` is set.
/// Uses the process-wide tag filter cache.
///
/// # Errors
/// Returns the first configuration, binding-contract or completeness error
pub fn define_feature<F>(host: &mut dyn HostRunner, feature: &Feature, callback: F) -> BindResult<()>
where
    F: FnOnce(&mut ScenarioDefiner<'_, '_>) -> BindResult<()>,
{
    define_feature_with_cache(host, feature, TagFilterCache::global(), callback)
}

/// [`define_feature`] with an explicit tag filter cache
///
/// # Errors
/// Returns the first configuration, binding-contract or completeness error
pub fn define_feature_with_cache<F>(
    host: &mut dyn HostRunner,
    feature: &Feature,
    filters: &TagFilterCache,
    callback: F,
) -> BindResult<()>
where
    F: FnOnce(&mut ScenarioDefiner<'_, '_>) -> BindResult<()>,
{
    let collapsed;
    let feature = if feature.options.collapse_rules && !feature.rules.is_empty() {
        collapsed = feature.collapse_rules();
        &collapsed
    } else {
        feature
    };
    debug!(feature = %feature.title, "defining feature");
    define_group(host, GroupRef::Feature(feature), filters, callback)
}

/// Bind a feature rule by rule
///
/// The callback receives a [`RuleDefiner`]; each rule is then defined like
/// a feature of its own. `collapse_rules` is ignored.
///
/// # Errors
/// Returns the first configuration, binding-contract or completeness error
pub fn define_rule_based_feature<F>(
    host: &mut dyn HostRunner,
    feature: &Feature,
    callback: F,
) -> BindResult<()>
where
    F: FnOnce(&mut RuleDefiner<'_, '_>) -> BindResult<()>,
{
    define_rule_based_feature_with_cache(host, feature, TagFilterCache::global(), callback)
}

/// [`define_rule_based_feature`] with an explicit tag filter cache
///
/// # Errors
/// Returns the first configuration, binding-contract or completeness error
pub fn define_rule_based_feature_with_cache<F>(
    host: &mut dyn HostRunner,
    feature: &Feature,
    filters: &TagFilterCache,
    callback: F,
) -> BindResult<()>
where
    F: FnOnce(&mut RuleDefiner<'_, '_>) -> BindResult<()>,
{
    let mut session = GroupSession::resolve(GroupRef::Feature(feature), filters)?;
    if !session.has_active_content() {
        debug!(feature = %feature.title, "no active rules, nothing to register");
        return Ok(());
    }
    debug!(feature = %feature.title, rules = feature.rules.len(), "defining rule-based feature");

    let errors = feature.options.errors;
    host.group(
        &feature.title,
        Box::new(|host: &mut dyn HostRunner| {
            callback(&mut RuleDefiner {
                inner: ScenarioDefiner {
                    session: &mut session,
                    host,
                    filters,
                },
            })?;
            check_rules(&session, &errors)
        }),
    )
}

fn define_group<F>(
    host: &mut dyn HostRunner,
    group: GroupRef<'_>,
    filters: &TagFilterCache,
    callback: F,
) -> BindResult<()>
where
    F: FnOnce(&mut ScenarioDefiner<'_, '_>) -> BindResult<()>,
{
    let mut session = GroupSession::resolve(group, filters)?;
    let title = session.title();
    if !session.has_active_content() {
        debug!(group = title, "no active scenarios, nothing to register");
        return Ok(());
    }

    let errors = group.options().errors;
    host.group(
        title,
        Box::new(|host: &mut dyn HostRunner| {
            callback(&mut ScenarioDefiner {
                session: &mut session,
                host,
                filters,
            })?;
            check_group(&session, &errors)
        }),
    )
}

/// Handle for defining the scenarios of one feature or rule
pub struct ScenarioDefiner<'s, 'g> {
    session: &'s mut GroupSession<'g>,
    host: &'s mut dyn HostRunner,
    filters: &'s TagFilterCache,
}

impl ScenarioDefiner<'_, '_> {
    /// Title of the feature or rule being defined
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        self.session.title()
    }

    /// Define a scenario or outline as a plain test
    ///
    /// # Errors
    /// Fails on an unknown or ambiguous title, on any error returned by
    /// `callback`, and on steps left unbound
    pub fn test<F>(&mut self, title: &str, callback: F) -> BindResult<()>
    where
        F: FnOnce(&mut StepDefiner<'_, '_>) -> BindResult<()>,
    {
        self.define(title, TestMode::Normal, None, callback)
    }

    /// Define a scenario registered as skipped
    ///
    /// # Errors
    /// Same as [`test`](Self::test)
    pub fn skip<F>(&mut self, title: &str, callback: F) -> BindResult<()>
    where
        F: FnOnce(&mut StepDefiner<'_, '_>) -> BindResult<()>,
    {
        self.define(title, TestMode::Skip, None, callback)
    }

    /// Define a focused scenario
    ///
    /// # Errors
    /// Same as [`test`](Self::test)
    pub fn only<F>(&mut self, title: &str, callback: F) -> BindResult<()>
    where
        F: FnOnce(&mut StepDefiner<'_, '_>) -> BindResult<()>,
    {
        self.define(title, TestMode::Only, None, callback)
    }

    /// Define a scenario the host may run concurrently
    ///
    /// # Errors
    /// Same as [`test`](Self::test)
    pub fn concurrent<F>(&mut self, title: &str, callback: F) -> BindResult<()>
    where
        F: FnOnce(&mut StepDefiner<'_, '_>) -> BindResult<()>,
    {
        self.define(title, TestMode::Concurrent, None, callback)
    }

    /// Define a plain test with a host timeout
    ///
    /// # Errors
    /// Same as [`test`](Self::test)
    pub fn test_with_timeout<F>(&mut self, title: &str, timeout: Duration, callback: F) -> BindResult<()>
    where
        F: FnOnce(&mut StepDefiner<'_, '_>) -> BindResult<()>,
    {
        self.define(title, TestMode::Normal, Some(timeout), callback)
    }

    /// Define a scenario with an explicit mode and optional timeout
    ///
    /// # Errors
    /// Same as [`test`](Self::test)
    pub fn define<F>(
        &mut self,
        title: &str,
        mode: TestMode,
        timeout: Option<Duration>,
        callback: F,
    ) -> BindResult<()>
    where
        F: FnOnce(&mut StepDefiner<'_, '_>) -> BindResult<()>,
    {
        let options = self.session.group.options();
        let Some(target) = self.session.find(title)? else {
            if options.errors.missing_scenario_in_feature {
                return Err(BindError::ScenarioNotFound {
                    title: title.to_string(),
                });
            }
            warn!(group = self.session.title(), scenario = title, "no scenario with this title, ignoring");
            return Ok(());
        };
        if self.session.is_defined(target) {
            return Err(BindError::ScenarioAlreadyDefined {
                title: title.to_string(),
            });
        }

        let active: Vec<ScenarioKey> = self
            .session
            .scenarios_of(target)
            .into_iter()
            .filter(|key| !self.session.slot(*key).is_skipped())
            .collect();
        if active.is_empty() {
            debug!(scenario = title, "every instance skipped by tag filter");
            self.session.mark_defined(target);
            return Ok(());
        }
        debug!(scenario = title, instances = active.len(), mode = mode.as_str(), "defining scenario");

        let mut steps = StepDefiner {
            session: &mut *self.session,
            keys: &active,
            pending: false,
        };
        callback(&mut steps)?;
        let pending = steps.pending;

        for key in active {
            self.register(key, title, mode, timeout, pending)?;
        }
        self.session.mark_defined(target);
        Ok(())
    }

    /// Define a rule of this feature as a nested group
    ///
    /// Only meaningful when rules were not collapsed into the feature.
    ///
    /// # Errors
    /// Fails with [`BindError::RuleNotFound`] unless exactly one rule
    /// carries `title`, with [`BindError::RuleAlreadyDefined`] on a second
    /// definition, then as [`define_feature`]
    pub fn rule<F>(&mut self, title: &str, callback: F) -> BindResult<()>
    where
        F: FnOnce(&mut ScenarioDefiner<'_, '_>) -> BindResult<()>,
    {
        let Some(index) = self.session.find_rule(title) else {
            return Err(BindError::RuleNotFound {
                title: title.to_string(),
            });
        };
        let entry = &mut self.session.rules[index];
        if entry.defined {
            return Err(BindError::RuleAlreadyDefined {
                title: entry.rule.title.clone(),
            });
        }
        entry.defined = true;
        let rule = entry.rule;
        let feature = self.session.group.feature();
        debug!(rule = %rule.title, "defining rule");
        define_group(self.host, GroupRef::Rule { rule, feature }, self.filters, callback)
    }

    /// Freeze one concrete scenario and hand it to the host
    fn register(
        &mut self,
        key: ScenarioKey,
        title: &str,
        mode: TestMode,
        timeout: Option<Duration>,
        pending: bool,
    ) -> BindResult<()> {
        let group = self.session.group;
        let options = group.options();
        let scenario = self.session.slot(key).scenario;

        let name = match &options.scenario_name_template {
            Some(template) => template
                .render(&ScenarioNameVars {
                    feature_title: group.container().title(),
                    scenario_title: title,
                    feature_tags: group.container().tags(),
                    scenario_tags: &scenario.tags,
                })
                .map_err(|e| BindError::name_template(title, &e))?,
            None => title.to_string(),
        };

        let slot = self.session.slot_mut(key);
        check_scenario_steps(slot, title, &options.errors)?;
        if slot.state == ScenarioState::Active {
            slot.advance(ScenarioState::Binding)?;
        }
        slot.advance(ScenarioState::Bound)?;

        let bound = Arc::new(slot.freeze(title));
        if pending || probe_pending(&bound) {
            slot.advance(ScenarioState::DisabledRegistered)?;
            info!(scenario = %name, line = scenario.line_number, "registering pending scenario as disabled");
            self.host.disabled_test(&name);
        } else {
            slot.advance(ScenarioState::Registered)?;
            self.host.test(
                mode,
                &name,
                Box::new(move || run_scenario(bound).boxed()),
                timeout,
            );
        }
        Ok(())
    }
}

/// Handle for defining the rules of a rule-based feature
pub struct RuleDefiner<'s, 'g> {
    inner: ScenarioDefiner<'s, 'g>,
}

impl RuleDefiner<'_, '_> {
    /// Title of the feature
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        self.inner.title()
    }

    /// Define one rule's scenarios
    ///
    /// # Errors
    /// Fails with [`BindError::RuleNotFound`] unless exactly one rule
    /// carries `title`, with [`BindError::RuleAlreadyDefined`] on a second
    /// definition, then as [`define_feature`]
    pub fn rule<F>(&mut self, title: &str, callback: F) -> BindResult<()>
    where
        F: FnOnce(&mut ScenarioDefiner<'_, '_>) -> BindResult<()>,
    {
        self.inner.rule(title, callback)
    }
}

/// Handle for binding the steps of the scenario being defined
///
/// For an outline every bind call applies to each active instance.
///
/// # Pending detection
///
/// When the scenario is registered, every bound step function is called
/// once with a registration-time context and its future polled a single
/// time, to find steps that call [`StepContext::pending`]. Whatever a step body does before
/// its first `.await` therefore also runs at definition time. Steps with
/// side effects should return early when [`StepContext::is_probe`] is true:
///
/// ```rust,ignore
/// steps.given("a clean database", move |ctx| {
///     let db = db.clone();
///     async move {
///         if ctx.is_probe() {
///             return Ok(());
///         }
///         db.reset().await
///     }
/// })?;
/// ```
///
/// [`pending`](Self::pending) marks the scenario pending without calling the steps.
pub struct StepDefiner<'s, 'g> {
    session: &'s mut GroupSession<'g>,
    keys: &'s [ScenarioKey],
    pending: bool,
}

impl StepDefiner<'_, '_> {
    /// Bind a `Given` step
    ///
    /// # Errors
    /// Fails if the binding violates step order or matches no step, or
    /// more than one step
    pub fn given<M, F, Fut>(&mut self, matcher: M, function: F) -> BindResult<()>
    where
        M: Into<StepMatcher>,
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.define_step(matcher, function)
    }

    /// Bind a `When` step
    ///
    /// # Errors
    /// Same as [`given`](Self::given)
    pub fn when<M, F, Fut>(&mut self, matcher: M, function: F) -> BindResult<()>
    where
        M: Into<StepMatcher>,
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.define_step(matcher, function)
    }

    /// Bind a `Then` step
    ///
    /// # Errors
    /// Same as [`given`](Self::given)
    pub fn then<M, F, Fut>(&mut self, matcher: M, function: F) -> BindResult<()>
    where
        M: Into<StepMatcher>,
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.define_step(matcher, function)
    }

    /// Bind an `And` step
    ///
    /// # Errors
    /// Same as [`given`](Self::given)
    pub fn and<M, F, Fut>(&mut self, matcher: M, function: F) -> BindResult<()>
    where
        M: Into<StepMatcher>,
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.define_step(matcher, function)
    }

    /// Bind a `But` step
    ///
    /// # Errors
    /// Same as [`given`](Self::given)
    pub fn but<M, F, Fut>(&mut self, matcher: M, function: F) -> BindResult<()>
    where
        M: Into<StepMatcher>,
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.define_step(matcher, function)
    }

    /// Bind the next step regardless of its keyword
    ///
    /// # Errors
    /// Same as [`given`](Self::given)
    pub fn define_step<M, F, Fut>(&mut self, matcher: M, function: F) -> BindResult<()>
    where
        M: Into<StepMatcher>,
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.bind(matcher.into(), step_fn(function))
    }

    /// Bind an already type-erased step function
    ///
    /// # Errors
    /// Same as [`given`](Self::given)
    pub fn bind(&mut self, matcher: StepMatcher, function: StepFn) -> BindResult<()> {
        let binding = StepBinding::new(matcher, function);
        let errors = self.session.group.options().errors;
        for key in self.keys {
            bind_step(self.session.slot_mut(*key), &binding, &errors)?;
        }
        Ok(())
    }

    /// Register the scenario as a disabled test instead of running it
    pub fn pending(&mut self) {
        self.pending = true;
    }

    /// Number of concrete scenarios each bind call applies to
    #[inline]
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.keys.len()
    }
}
