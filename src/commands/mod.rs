//! Chat commands: `!ping`, `!help`, `!checkcapa` and the CAPA lookups.
//!
//! Commands are matched case-sensitively on the first word; arguments are
//! upper-cased before lookup.

#[cfg(test)]
mod tests;

use crate::ledger::Ledger;
use capa_core::traits::SheetSource;
use capa_report::{
    eligibility::partition, group_by_department, group_by_pic, render, CapaRecord, KeyFilter,
    Scope,
};
use chrono::NaiveDate;
use tracing::{error, info};

const HELP: &str = "*!ping* : check monitoring CAPA is active, if the system reply pong = active \n\
*!checkcapa* : check validation data master CAPA \n\
*!getcapapic [initial]* : get CAPA status OPEN depend on PIC \n\
*!getcapadept [department]* : get CAPA status OPEN depend on department \n\
*!getcapaoverdue [department]* : get overdue CAPA status OPEN depend on department \n";

const CHECK_FAILED: &str = "wait for moment and try again.";
const LOOKUP_FAILED: &str = "Can't get data 🙏🏻. Try again later.";
const MISSING_PIC: &str = "Please input the PIC.";
const MISSING_DEPT: &str = "Please input the department.";

/// Known chat commands. `None` arguments mean the user sent no argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Help,
    CheckCapa,
    PicLookup(Option<String>),
    DepartmentLookup(Option<String>),
    OverdueLookup(Option<String>),
}

impl Command {
    /// Parse a command from message text. Unknown text yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let cmd = words.next()?;
        let arg = words.next().map(str::to_uppercase);
        match cmd {
            "!ping" => Some(Self::Ping),
            "!help" => Some(Self::Help),
            "!checkcapa" => Some(Self::CheckCapa),
            "!getcapapic" => Some(Self::PicLookup(arg)),
            "!getcapadept" => Some(Self::DepartmentLookup(arg)),
            "!getcapaoverdue" => Some(Self::OverdueLookup(arg)),
            _ => None,
        }
    }
}

/// Answer to a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: String,
    /// Matching records left out of `text` because their target date could
    /// not be read. The caller raises the date warning for them.
    pub unparseable: Vec<CapaRecord>,
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self {
            text,
            unparseable: Vec::new(),
        }
    }
}

/// Produce the reply for a command.
///
/// Sheet failures are logged and answered with a retry hint; this never
/// fails.
pub async fn handle(cmd: Command, sheets: &dyn SheetSource, today: NaiveDate) -> Reply {
    let text = match cmd {
        Command::Ping => "pong".to_string(),
        Command::Help => HELP.to_string(),
        Command::CheckCapa => match Ledger::fetch(sheets).await {
            Ok(ledger) => {
                let summary = capa_report::check(&ledger.records, &ledger.directory);
                info!(
                    "checkcapa: {} without status, {} open without PIC, {} unknown PICs",
                    summary.no_status.len(),
                    summary.open_without_pic.len(),
                    summary.unknown_pics.len()
                );
                render::render_check_summary(&summary)
            }
            Err(e) => {
                error!("checkcapa failed: {e}");
                CHECK_FAILED.to_string()
            }
        },
        Command::PicLookup(None) => MISSING_PIC.to_string(),
        Command::PicLookup(Some(pic)) => match Ledger::fetch(sheets).await {
            Ok(ledger) => {
                let report = group_by_pic(&ledger.open(), &KeyFilter::only(&pic));
                render::render_pic_lookup(&pic, &report)
            }
            Err(e) => {
                error!("getcapapic {pic} failed: {e}");
                LOOKUP_FAILED.to_string()
            }
        },
        Command::DepartmentLookup(None) | Command::OverdueLookup(None) => MISSING_DEPT.to_string(),
        Command::DepartmentLookup(Some(dept)) => {
            return department_reply(sheets, &dept, Scope::All, today).await;
        }
        Command::OverdueLookup(Some(dept)) => {
            return department_reply(sheets, &dept, Scope::Overdue, today).await;
        }
    };
    text.into()
}

async fn department_reply(
    sheets: &dyn SheetSource,
    dept: &str,
    scope: Scope,
    today: NaiveDate,
) -> Reply {
    match Ledger::fetch(sheets).await {
        Ok(ledger) => {
            let eligible = partition(&ledger.open(), scope, today);
            let report = group_by_department(&eligible.records, &KeyFilter::only(dept));
            Reply {
                text: render::render_department_lookup(dept, &report),
                unparseable: eligible
                    .unparseable
                    .into_iter()
                    .filter(|r| r.departments().iter().any(|d| d == dept))
                    .collect(),
            }
        }
        Err(e) => {
            error!("department lookup {dept} failed: {e}");
            LOOKUP_FAILED.to_string().into()
        }
    }
}
