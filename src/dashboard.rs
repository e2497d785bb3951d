use crate::change::{ChangeDetector, ChangeRecord, RenderDecision};
use crate::config::{Config, EndpointConfig};
use crate::display::{DisplayDevice, DisplayError};
use crate::fetcher::{StatusError, StatusSource};
use crate::network::InterfaceUnavailable;
use crate::render::DashboardRenderer;
use crate::state::StatusSnapshot;
use crate::summary::{build_summary, error_summary};
use chrono::NaiveTime;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Rendered,
    Unchanged,
}

#[derive(Debug, Error)]
pub enum CycleError {
    /// The error screen has already been shown.
    #[error(transparent)]
    Status(StatusError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

pub struct Dashboard<S, R, D> {
    source: S,
    detector: ChangeDetector<R>,
    renderer: DashboardRenderer,
    display: D,
    primary: EndpointConfig,
    secondary: EndpointConfig,
}

impl<S, R, D> Dashboard<S, R, D>
where
    S: StatusSource,
    R: ChangeRecord,
    D: DisplayDevice,
{
    pub fn new(source: S, record: R, display: D, cfg: &Config) -> Self {
        Self {
            source,
            detector: ChangeDetector::new(record),
            renderer: DashboardRenderer::new(display.size()),
            display,
            primary: cfg.primary.clone(),
            secondary: cfg.secondary.clone(),
        }
    }

    /// One poll: fetch both endpoints, build the summary and redraw the panel
    /// if it differs from the last frame (or `force` is set).
    pub fn poll(
        &mut self,
        network: Result<Ipv4Addr, InterfaceUnavailable>,
        now: NaiveTime,
        force: bool,
    ) -> Result<CycleOutcome, CycleError> {
        let (primary, secondary) = match self.fetch_both() {
            Ok(pair) => pair,
            Err(err) => {
                self.show_error(&err, now);
                return Err(CycleError::Status(err));
            }
        };

        let local_ip = match network {
            Ok(ip) => Some(ip.to_string()),
            Err(err) => {
                warn!(error = %err, "нет сетевого адреса, на панели будет предупреждение");
                None
            }
        };

        let summary = build_summary(&primary, &secondary, local_ip.as_deref());

        if force {
            if let Err(err) = self.detector.remember(&summary) {
                warn!(error = %err, "не удалось сохранить хэш кадра");
            }
        } else {
            match self.detector.check(&summary) {
                Ok(RenderDecision::Unchanged) => {
                    info!("данные не изменились, перерисовка не нужна");
                    return Ok(CycleOutcome::Unchanged);
                }
                Ok(RenderDecision::Changed { digest }) => {
                    debug!(digest = %digest, "данные изменились");
                }
                Err(err) => {
                    warn!(error = %err, "не удалось сверить хэш кадра, перерисовываем");
                }
            }
        }

        if let Err(err) = self.renderer.render(
            &mut self.display,
            &summary.status_line,
            Some(&summary.body_text),
            now,
        ) {
            self.forget_frame();
            return Err(err.into());
        }

        info!(status = %summary.status_line, "кадр выведен на дисплей");
        Ok(CycleOutcome::Rendered)
    }

    fn fetch_both(&self) -> Result<(StatusSnapshot, StatusSnapshot), StatusError> {
        let primary = self.fetch(&self.primary)?;
        let secondary = self.fetch(&self.secondary)?;
        Ok((primary, secondary))
    }

    fn fetch(&self, endpoint: &EndpointConfig) -> Result<StatusSnapshot, StatusError> {
        let snapshot = self.source.fetch(endpoint)?;
        debug!(
            host = %endpoint.host,
            port = endpoint.port,
            queries_today = snapshot.queries_today,
            status = %snapshot.status,
            "получен статус"
        );
        Ok(snapshot)
    }

    fn show_error(&mut self, err: &StatusError, now: NaiveTime) {
        error!(error = %err, schema = err.is_schema(), "ошибка API Pi-hole");
        let summary = error_summary(
            &err.raw_response(),
            self.renderer.text_columns(),
            self.renderer.text_rows(),
        );
        if let Err(display_err) = self.renderer.render(
            &mut self.display,
            &summary.status_line,
            Some(&summary.body_text),
            now,
        ) {
            error!(error = %display_err, "не удалось вывести экран ошибки");
        }
        self.forget_frame();
    }

    fn forget_frame(&mut self) {
        if let Err(err) = self.detector.invalidate() {
            warn!(error = %err, "не удалось сбросить хэш кадра");
        }
    }
}
