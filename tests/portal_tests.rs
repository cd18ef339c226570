//! Tests for the portal domain layer

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use propdesk::api::ApiResponse;
    use propdesk::eligibility::{
        evaluate, ChallengeWindow, RiskBreach, Verdict, RISK_VIOLATION_MESSAGE,
    };
    use propdesk::providers::{generate_account_password, PaymentIntentRequest};
    use propdesk::types::{
        AccountStatus, AuditAction, AuditRecord, PlatformKind, StoreTimestamp, Tier,
        TradingAccount, TradingMetrics,
    };
    use propdesk::validation::{is_university_email, is_valid_email, validate_upload};

    fn make_metrics(
        daily_trade_count: u32,
        daily_loss_percent: f64,
        total_loss_percent: f64,
        total_gain_percent: f64,
    ) -> TradingMetrics {
        TradingMetrics {
            rank: 5,
            total_traders: 40,
            daily_trade_count,
            daily_loss_percent,
            total_loss_percent,
            total_gain_percent,
            consistency_score: 80.0,
        }
    }

    fn make_tier(price: Decimal) -> Tier {
        Tier {
            id: "tier-25k".to_string(),
            name: "25K Evaluation".to_string(),
            price,
            description: "Simulated funded account".to_string(),
            features: vec!["1:100 leverage".to_string()],
            featured: true,
            is_available: true,
        }
    }

    // ============================================================================
    // Eligibility evaluation
    // ============================================================================

    #[test]
    fn test_checklist_has_four_fixed_items() {
        let evaluation = evaluate(&make_metrics(5, -2.0, -4.0, 3.0), 10.0);

        let labels: Vec<&str> = evaluation
            .checklist
            .iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "More than 3 trades per day",
                "Daily loss within limit",
                "Total loss within limit",
                "Positive total gain",
            ]
        );
        assert!(evaluation.checklist.iter().all(|item| item.passed));
        assert_eq!(evaluation.verdict, Verdict::OnTrack);
    }

    #[test]
    fn test_daily_breach_takes_precedence() {
        let evaluation = evaluate(&make_metrics(5, -6.0, -11.0, 0.0), 10.0);

        assert_eq!(
            evaluation.verdict,
            Verdict::Failed {
                breach: RiskBreach::DailyLoss
            }
        );
        assert_eq!(evaluation.verdict.message(), Some(RISK_VIOLATION_MESSAGE));
    }

    #[test]
    fn test_loss_limits_compare_absolute_values() {
        // Signed either way, only the magnitude counts.
        let negative = evaluate(&make_metrics(5, -1.0, -10.5, 0.0), 10.0);
        let positive = evaluate(&make_metrics(5, -1.0, 10.5, 0.0), 10.0);

        for evaluation in [negative, positive] {
            assert_eq!(
                evaluation.verdict,
                Verdict::Failed {
                    breach: RiskBreach::TotalLoss
                }
            );
        }
    }

    #[test]
    fn test_limits_are_inclusive_at_the_boundary() {
        let evaluation = evaluate(&make_metrics(3, -5.0, -10.0, 0.5), 10.0);

        assert_eq!(evaluation.verdict, Verdict::OnTrack);
        assert!(evaluation.checklist[0].passed, "three trades meet the bar");
        assert!(evaluation.checklist[1].passed);
        assert!(evaluation.checklist[2].passed);
    }

    #[test]
    fn test_low_activity_never_fails_the_challenge() {
        let evaluation = evaluate(&make_metrics(0, -1.0, -2.0, -0.5), 10.0);

        assert!(!evaluation.checklist[0].passed);
        assert!(!evaluation.checklist[3].passed);
        assert_eq!(evaluation.verdict, Verdict::OnTrack);
        assert_eq!(evaluation.verdict.message(), None);
    }

    #[test]
    fn test_profit_target_is_a_separate_signal() {
        // Target met and risk breached can coexist.
        let evaluation = evaluate(&make_metrics(5, -6.0, -2.0, 12.0), 10.0);

        assert!(evaluation.profit_target_reached);
        assert!(evaluation.verdict.is_failed());

        let at_target = evaluate(&make_metrics(5, -1.0, -1.0, 10.0), 10.0);
        assert!(at_target.profit_target_reached, "target is inclusive");
    }

    #[test]
    fn test_verdict_serializes_with_a_state_tag() {
        let evaluation = evaluate(&make_metrics(5, -6.0, 0.0, 0.0), 10.0);
        let json = serde_json::to_value(&evaluation.verdict).unwrap();

        assert_eq!(json["state"], "failed");
        assert_eq!(json["breach"], "daily_loss");

        let on_track = serde_json::to_value(Verdict::OnTrack).unwrap();
        assert_eq!(on_track["state"], "on_track");
    }

    // ============================================================================
    // Challenge window
    // ============================================================================

    #[test]
    fn test_window_rejects_backwards_ranges() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

        assert!(ChallengeWindow::new(start, start).is_err());
        assert!(ChallengeWindow::new(start, start - Duration::days(1)).is_err());
        assert!(ChallengeWindow::new(start, start + Duration::hours(1)).is_ok());
    }

    #[test]
    fn test_progress_is_clamped_to_the_window() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let window = ChallengeWindow::new(start, start + Duration::days(30)).unwrap();

        assert_eq!(window.progress_percent(start - Duration::days(3)), 0.0);
        assert_eq!(window.progress_percent(start + Duration::days(15)), 50.0);
        assert_eq!(window.progress_percent(start + Duration::days(45)), 100.0);
    }

    #[test]
    fn test_partial_days_count_as_whole_days() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let window = ChallengeWindow::new(start, start + Duration::days(10)).unwrap();

        assert_eq!(window.duration_days(), 10);
        assert_eq!(window.elapsed_days(start + Duration::hours(36)), 2);
        assert_eq!(window.progress_percent(start + Duration::hours(36)), 20.0);
    }

    // ============================================================================
    // Validation
    // ============================================================================

    #[test]
    fn test_email_format_rules() {
        assert!(is_valid_email("trader@propdesk.app"));
        assert!(is_valid_email("first.last+tag@sub.domain.com"));

        assert!(!is_valid_email("trader@propdesk"));
        assert!(!is_valid_email("trader propdesk@x.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn test_university_membership_ignores_case() {
        assert!(is_university_email("Student@Connect.HKU.hk"));
        assert!(is_university_email("someone@polyu.edu.hk"));
        assert!(!is_university_email("someone@outlook.com"));
    }

    #[test]
    fn test_upload_documents_must_name_their_login() {
        let raw = serde_json::json!({
            "tradingMetrics": {
                "rank": 1,
                "totalTraders": 10,
                "dailyTradeCount": 4,
                "dailyLossPercent": -1.0,
                "totalLossPercent": -2.0,
                "totalGainPercent": 3.0,
                "consistencyScore": 88.0
            },
            "equityData": [],
            "underwaterData": [],
            "tradeHistory": {
                "previousTrades": [],
                "bestTrades": [],
                "worstTrades": []
            }
        });

        let document = serde_json::from_value(raw.clone()).unwrap();
        assert!(validate_upload(&document).is_err());

        let mut with_login = raw;
        with_login["mt5Login"] = serde_json::json!("700112");
        let document = serde_json::from_value(with_login).unwrap();
        assert_eq!(validate_upload(&document), Ok("700112"));
    }

    // ============================================================================
    // Normalized account model
    // ============================================================================

    #[test]
    fn test_accounts_serialize_for_the_frontend() {
        let account = TradingAccount {
            id: "acc-1".to_string(),
            kind: PlatformKind::Mt5,
            server: "PropDesk-Demo".to_string(),
            login: "700112".to_string(),
            password: "secret".to_string(),
            email: "trader@example.com".to_string(),
            status: AccountStatus::Active,
            challenge_id: None,
            demo_account_id: Some("demo-9".to_string()),
            created_at: None,
            updated_at: None,
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["kind"], "mt5");
        assert_eq!(json["status"], "active");
        assert_eq!(json["demoAccountId"], "demo-9");
        assert!(json.get("challengeId").is_none());
        assert!(!account.credentials_blanked());
    }

    #[test]
    fn test_blanked_credentials_are_detected() {
        let account = TradingAccount {
            id: "acc-1".to_string(),
            kind: PlatformKind::Mtt,
            server: "matchtrader".to_string(),
            login: String::new(),
            password: String::new(),
            email: "trader@example.com".to_string(),
            status: AccountStatus::Inactive,
            challenge_id: None,
            demo_account_id: None,
            created_at: None,
            updated_at: None,
        };

        assert!(account.credentials_blanked());
    }

    #[test]
    fn test_store_timestamps_round_trip() {
        let timestamp: StoreTimestamp =
            serde_json::from_str(r#"{"_seconds":1735689600,"_nanoseconds":500000000}"#).unwrap();

        let datetime = timestamp.to_datetime().unwrap();
        assert_eq!(datetime.timestamp(), 1735689600);
        assert_eq!(StoreTimestamp::from_datetime(datetime), timestamp);

        let json = serde_json::to_value(timestamp).unwrap();
        assert_eq!(json["_seconds"], 1735689600);
    }

    #[test]
    fn test_audit_records_use_wire_field_names() {
        let record = AuditRecord::new(
            AuditAction::StatusChange,
            "trader@example.com",
            "acc-1",
            serde_json::json!({ "previousStatus": "active", "newStatus": "inactive" }),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "STATUS_CHANGE");
        assert_eq!(json["accountId"], "acc-1");
        assert_eq!(json["details"]["previousStatus"], "active");
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_tier_prices_serialize_as_numbers() {
        let tier = make_tier(dec!(199.00));
        let json = serde_json::to_value(&tier).unwrap();

        assert_eq!(json["price"], 199.0);

        let parsed: Tier = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.price, dec!(199.00));
    }

    // ============================================================================
    // Payments
    // ============================================================================

    #[test]
    fn test_purchase_requests_carry_the_caller_identity() {
        let tier = make_tier(dec!(199.00));
        let request =
            PaymentIntentRequest::for_purchase(&tier, "user-7", "trader@example.com", "usd")
                .unwrap();

        assert_eq!(request.amount, 19_900);
        assert_eq!(request.currency, "usd");
        assert_eq!(request.receipt_email, "trader@example.com");
        assert_eq!(request.user_id, "user-7");
        assert_eq!(request.tier_id, "tier-25k");
    }

    #[test]
    fn test_unconvertible_prices_are_rejected() {
        // 1e20 in minor units no longer fits an i64.
        let tier = make_tier(Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0));
        assert!(PaymentIntentRequest::for_purchase(&tier, "u", "e@x.com", "usd").is_none());
    }

    // ============================================================================
    // API envelope + platform parsing
    // ============================================================================

    #[test]
    fn test_api_response_envelope_shapes() {
        let success = serde_json::to_value(ApiResponse::success(7)).unwrap();
        assert_eq!(success["success"], true);
        assert_eq!(success["data"], 7);
        assert!(success["error"].is_null());

        let failure = serde_json::to_value(ApiResponse::<i32>::error("nope")).unwrap();
        assert_eq!(failure["success"], false);
        assert!(failure["data"].is_null());
        assert_eq!(failure["error"], "nope");
    }

    #[test]
    fn test_platform_names_parse_with_aliases() {
        assert_eq!(PlatformKind::from_str("MT5"), Some(PlatformKind::Mt5));
        assert_eq!(PlatformKind::from_str("mtt"), Some(PlatformKind::Mtt));
        assert_eq!(
            PlatformKind::from_str("MatchTrader"),
            Some(PlatformKind::Mtt)
        );
        assert_eq!(PlatformKind::from_str("ctrader"), None);
    }

    #[test]
    fn test_generated_passwords_meet_broker_rules() {
        let password = generate_account_password();

        assert_eq!(password.len(), 12);
        assert!(password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!@#$%^&*".contains(c)));
        assert_ne!(generate_account_password(), generate_account_password());
    }
}
