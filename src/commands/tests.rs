use super::*;
use crate::testutil::{capa_row, directory_header, directory_row, MockSheets};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn sheets(capa: Vec<Vec<String>>, directory: Vec<Vec<String>>) -> MockSheets {
    let mut rows = vec![directory_header()];
    rows.extend(directory);
    MockSheets {
        capa,
        directory: rows,
        fail: false,
    }
}

#[test]
fn test_parse_all_commands() {
    assert_eq!(Command::parse("!ping"), Some(Command::Ping));
    assert_eq!(Command::parse("!help"), Some(Command::Help));
    assert_eq!(Command::parse("!checkcapa"), Some(Command::CheckCapa));
    assert_eq!(
        Command::parse("!getcapapic budi"),
        Some(Command::PicLookup(Some("BUDI".into())))
    );
    assert_eq!(
        Command::parse("!getcapadept qa"),
        Some(Command::DepartmentLookup(Some("QA".into())))
    );
    assert_eq!(
        Command::parse("!getcapaoverdue prod"),
        Some(Command::OverdueLookup(Some("PROD".into())))
    );
}

#[test]
fn test_parse_is_case_sensitive() {
    assert_eq!(Command::parse("!PING"), None);
    assert_eq!(Command::parse("!Help"), None);
    assert_eq!(Command::parse("ping"), None);
    assert_eq!(Command::parse(""), None);
}

#[test]
fn test_parse_missing_argument() {
    assert_eq!(Command::parse("!getcapapic"), Some(Command::PicLookup(None)));
    assert_eq!(
        Command::parse("!getcapadept   "),
        Some(Command::DepartmentLookup(None))
    );
}

#[tokio::test]
async fn test_ping_and_help() {
    let s = MockSheets::default();
    assert_eq!(handle(Command::Ping, &s, today()).await.text, "pong");
    let help = handle(Command::Help, &s, today()).await.text;
    assert!(help.contains("*!getcapapic [initial]*"));
    assert!(help.contains("*!getcapaoverdue [department]*"));
}

#[tokio::test]
async fn test_missing_argument_replies() {
    let s = MockSheets::default();
    assert_eq!(
        handle(Command::PicLookup(None), &s, today()).await.text,
        "Please input the PIC."
    );
    assert_eq!(
        handle(Command::DepartmentLookup(None), &s, today()).await.text,
        "Please input the department."
    );
    assert_eq!(
        handle(Command::OverdueLookup(None), &s, today()).await.text,
        "Please input the department."
    );
}

#[tokio::test]
async fn test_getcapapic_splits_shared_pics() {
    let s = sheets(
        vec![capa_row("1", "QRM", "fix valve", "A,B", "PROD", "10 Mar 2024", "OPEN")],
        vec![directory_row("A", "081111111111", "", "")],
    );

    let a = handle(Command::parse("!getcapapic A").unwrap(), &s, today()).await.text;
    assert!(a.starts_with("*PIC: A*"));
    assert!(a.contains("*=== QRM ===*"));
    assert!(a.contains("- fix valve (10 Mar 2024)"));

    let b = handle(Command::parse("!getcapapic b").unwrap(), &s, today()).await.text;
    assert!(b.starts_with("*PIC: B*"));
    assert!(b.contains("*=== QRM ===*"));
    assert!(b.contains("- fix valve (10 Mar 2024)"));
    assert!(!b.contains("081111111111"));
}

#[tokio::test]
async fn test_getcapapic_ignores_closed_and_other_pics() {
    let s = sheets(
        vec![
            capa_row("1", "QRM", "done", "A", "PROD", "1 Jan 2024", "CLOSED"),
            capa_row("2", "QRM", "other", "AB", "PROD", "1 Jan 2024", "OPEN"),
        ],
        vec![],
    );
    let reply = handle(Command::PicLookup(Some("A".into())), &s, today()).await.text;
    assert_eq!(reply, "*PIC: A*\n\n*No CAPA* 🥳");
}

#[tokio::test]
async fn test_checkcapa_all_closed_is_empty() {
    let s = sheets(
        vec![
            capa_row("1", "QRM", "a", "A", "PROD", "1 Jan 2024", "CLOSED"),
            capa_row("2", "AUDIT", "b", "ZZ", "QA", "1 Feb 2024", "CLOSE"),
        ],
        vec![directory_row("A", "081111111111", "", "")],
    );
    let reply = handle(Command::CheckCapa, &s, today()).await.text;
    assert_eq!(
        reply,
        "CAPA tanpa status\nNo: **\n==========================\n\
         CAPA Open tanpa PIC\nNo: **\n==========================\n\
         CAPA Open tetapi PIC tidak terdaftar pada sheet PHONENUMBER\nInit: **"
    );
}

#[tokio::test]
async fn test_department_lookup_groups_by_pic() {
    let s = sheets(
        vec![
            capa_row("1", "QRM", "x", "A", "PROD", "1 Apr 2024", "OPEN"),
            capa_row("2", "QRM", "y", "B", "PROD/QA", "1 Feb 2024", "OPEN"),
        ],
        vec![],
    );
    let reply = handle(Command::parse("!getcapadept qa").unwrap(), &s, today()).await.text;
    assert!(reply.starts_with("*Department: QA*"));
    assert!(reply.contains("*PIC: B*"));
    assert!(!reply.contains("*PIC: A*"));
}

#[tokio::test]
async fn test_overdue_lookup_filters_dates() {
    let s = sheets(
        vec![
            capa_row("1", "QRM", "late", "A", "PROD", "1 Feb 2024", "OPEN"),
            capa_row("2", "QRM", "due today", "B", "PROD", "15 Mar 2024", "OPEN"),
            capa_row("3", "QRM", "future", "C", "PROD", "1 Apr 2024", "OPEN"),
        ],
        vec![],
    );
    let reply = handle(Command::parse("!getcapaoverdue PROD").unwrap(), &s, today()).await.text;
    assert!(reply.contains("late (1 Feb 2024)"));
    assert!(!reply.contains("due today"));
    assert!(!reply.contains("future"));
}

#[tokio::test]
async fn test_overdue_lookup_returns_unreadable_dates() {
    let s = sheets(
        vec![
            capa_row("1", "QRM", "late", "A", "PROD", "1 Feb 2024", "OPEN"),
            capa_row("2", "QRM", "vague", "B", "PROD", "sometime soon", "OPEN"),
            capa_row("3", "QRM", "elsewhere", "C", "QA", "whenever", "OPEN"),
        ],
        vec![],
    );
    let reply = handle(Command::parse("!getcapaoverdue PROD").unwrap(), &s, today()).await;
    assert!(!reply.text.contains("vague"));
    assert_eq!(reply.unparseable.len(), 1);
    assert_eq!(reply.unparseable[0].number, "2");

    let all = handle(Command::parse("!getcapadept PROD").unwrap(), &s, today()).await;
    assert!(all.text.contains("vague (sometime soon)"));
    assert!(all.unparseable.is_empty());
}

#[tokio::test]
async fn test_sheet_failure_replies() {
    let s = MockSheets {
        fail: true,
        ..Default::default()
    };
    assert_eq!(
        handle(Command::CheckCapa, &s, today()).await.text,
        "wait for moment and try again."
    );
    assert_eq!(
        handle(Command::PicLookup(Some("A".into())), &s, today()).await.text,
        "Can't get data 🙏🏻. Try again later."
    );
}
