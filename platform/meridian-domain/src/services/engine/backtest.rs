use super::execution::Execution;
use crate::entities::backtest_result::{BacktestResult, DateRange};
use crate::entities::portfolio::Portfolio;
use crate::errors::BacktestError;
use crate::services::analytics::{compute_metrics, rate, render_report};
use crate::services::indicators::IndicatorSet;
use crate::services::ohlcv::{prepare_bars, BarWindow, DataQualityReport};
use crate::services::strategy::{Strategy, StrategyFamily, StrategyKind};
use crate::value_objects::bar::{Bar, BarColumns};
use crate::value_objects::daily_return::DailyReturn;
use crate::value_objects::parameter::ParameterSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub window: BarWindow,
}

impl BacktestConfig {
    pub fn new(symbol: &str, initial_capital: f64, commission_rate: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            initial_capital,
            commission_rate,
            window: BarWindow::default(),
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::InvalidConfig(format!(
                "initial_capital must be > 0 (got {})",
                self.initial_capital
            )));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(BacktestError::InvalidConfig(format!(
                "commission_rate must be in [0, 1) (got {})",
                self.commission_rate
            )));
        }
        if let (Some(start), Some(end)) = (self.window.start, self.window.end) {
            if start > end {
                return Err(BacktestError::InvalidConfig(format!(
                    "start {start} is after end {end}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Complete,
    Cancelled,
}

/// Observer hooks for one run. Progress is one-way; cancellation is polled
/// once per bar.
#[derive(Default)]
pub struct RunHooks<'a> {
    pub on_progress: Option<&'a mut dyn FnMut(f64)>,
    pub should_cancel: Option<&'a (dyn Fn() -> bool + Sync)>,
}

impl RunHooks<'_> {
    fn progress(&mut self, fraction: f64) {
        if let Some(callback) = self.on_progress.as_deref_mut() {
            callback(fraction);
        }
    }

    fn cancelled(&self) -> bool {
        self.should_cancel.is_some_and(|check| check())
    }
}

/// Replays prepared bars through one strategy. One runner is one pass.
pub struct BacktestRunner<S: Strategy> {
    strategy: S,
    bars: Vec<Bar>,
    config: BacktestConfig,
    data_quality: DataQualityReport,
    state: RunState,
}

impl<S: Strategy> BacktestRunner<S> {
    pub fn new(strategy: S, bars: Vec<Bar>, config: BacktestConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        let step = strategy.timeframe().step_seconds;
        let (bars, data_quality) = prepare_bars(bars, config.window, Some(step));
        if bars.is_empty() {
            return Err(BacktestError::EmptyBarSequence {
                symbol: config.symbol.clone(),
            });
        }
        Ok(Self {
            strategy,
            bars,
            config,
            data_quality,
            state: RunState::Idle,
        })
    }

    pub fn data_quality(&self) -> &DataQualityReport {
        &self.data_quality
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run(&mut self) -> Result<BacktestResult, BacktestError> {
        self.run_with_hooks(RunHooks::default())
    }

    pub fn run_with_hooks(&mut self, mut hooks: RunHooks<'_>) -> Result<BacktestResult, BacktestError> {
        if self.state != RunState::Idle {
            return Err(BacktestError::AlreadyCompleted);
        }
        self.state = RunState::Running;

        let total = self.bars.len();
        let initial_capital = self.config.initial_capital;
        info!(
            strategy = self.strategy.name(),
            symbol = %self.config.symbol,
            bars = total,
            initial_capital,
            "backtest started"
        );

        let specs = self.strategy.required_indicators();
        let columns = BarColumns::from_bars(&self.bars);
        let mut portfolio = Portfolio::new_with_cash(initial_capital);
        let mut execution = Execution::new(&self.config.symbol, self.config.commission_rate);
        let mut trades = Vec::new();
        let mut daily_returns = Vec::with_capacity(total);
        let mut previous_value = initial_capital;

        for (i, bar) in self.bars.iter().enumerate() {
            if hooks.cancelled() {
                self.state = RunState::Cancelled;
                info!(processed = i, total, "backtest cancelled");
                return Err(BacktestError::Cancelled { processed: i, total });
            }

            let prefix = &self.bars[..=i];
            let indicators = IndicatorSet::compute(&specs, columns.prefix(i + 1));
            if let Some(signal) = self.strategy.generate_signal(prefix, &indicators) {
                debug!(
                    timestamp = bar.timestamp,
                    action = signal.action.as_str(),
                    confidence = signal.confidence,
                    "signal"
                );
                if let Some(trade) = execution.apply(&mut portfolio, &signal, bar) {
                    trades.push(trade);
                }
            }

            portfolio.mark(bar.close);
            let value = portfolio.total_value();
            daily_returns.push(DailyReturn {
                timestamp: bar.timestamp,
                portfolio_value: value,
                cash: portfolio.cash(),
                open_positions: portfolio.positions().len(),
                daily_pnl: value - previous_value,
            });
            previous_value = value;

            hooks.progress(i as f64 / total as f64);
        }
        hooks.progress(1.0);

        let metrics = compute_metrics(&trades, &daily_returns, initial_capital);
        let (rating_score, rating) = rate(&metrics);
        let mut result = BacktestResult {
            strategy_name: self.strategy.name().to_string(),
            symbol: self.config.symbol.clone(),
            date_range: DateRange {
                start: self.bars[0].timestamp,
                end: self.bars[total - 1].timestamp,
            },
            initial_capital,
            final_capital: portfolio.total_value(),
            trades,
            metrics,
            rating,
            rating_score,
            daily_returns,
            report: String::new(),
        };
        result.report = render_report(&result);
        self.state = RunState::Complete;

        info!(
            strategy = %result.strategy_name,
            trades = result.trades.len(),
            final_capital = result.final_capital,
            sharpe = result.metrics.sharpe_ratio,
            max_drawdown = result.metrics.max_drawdown,
            rating = result.rating.label(),
            "backtest complete"
        );
        Ok(result)
    }
}

impl BacktestRunner<StrategyKind> {
    /// Refuses to start when the parameters do not build a valid strategy.
    pub fn from_parameters(
        family: StrategyFamily,
        params: &ParameterSet,
        bars: Vec<Bar>,
        config: BacktestConfig,
    ) -> Result<Self, BacktestError> {
        let strategy = family.build(params)?;
        Self::new(strategy, bars, config)
    }
}
