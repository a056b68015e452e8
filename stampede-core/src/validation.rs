//! Structural and bounds validation of test definitions

use crate::definition::TestDefinition;
use crate::error::ValidationError;

/// Upper bound on virtual users per test
pub const MAX_CONCURRENT_USERS: i64 = 1000;

/// Upper bound on run duration, in seconds
pub const MAX_DURATION_SECONDS: i64 = 3600;

/// Validate a test definition
///
/// Checks run in a fixed order and the first violation is returned. The
/// function has no side effects and must pass before any worker is
/// scheduled.
pub fn validate_definition(definition: &TestDefinition) -> Result<(), ValidationError> {
    if definition.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if definition.concurrent_users <= 0 {
        return Err(ValidationError::ConcurrencyTooLow(definition.concurrent_users));
    }

    if definition.concurrent_users > MAX_CONCURRENT_USERS {
        return Err(ValidationError::ConcurrencyTooHigh {
            actual: definition.concurrent_users,
            max: MAX_CONCURRENT_USERS,
        });
    }

    if definition.duration_seconds <= 0 {
        return Err(ValidationError::DurationTooShort(definition.duration_seconds));
    }

    if definition.duration_seconds > MAX_DURATION_SECONDS {
        return Err(ValidationError::DurationTooLong {
            actual: definition.duration_seconds,
            max: MAX_DURATION_SECONDS,
        });
    }

    if definition.scenarios.is_empty() {
        return Err(ValidationError::NoScenarios);
    }

    for (index, scenario) in definition.scenarios.iter().enumerate() {
        if scenario.url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl { index });
        }

        if scenario.method.trim().is_empty() {
            return Err(ValidationError::EmptyMethod { index });
        }

        if scenario.weight < 0 {
            return Err(ValidationError::NegativeWeight {
                index,
                weight: scenario.weight,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Scenario;

    fn valid_definition() -> TestDefinition {
        TestDefinition::new(
            1,
            "smoke",
            5,
            2,
            vec![Scenario::new("GET", "http://localhost:8080/health")],
        )
    }

    #[test]
    fn test_valid_definition_passes() {
        assert!(validate_definition(&valid_definition()).is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut definition = valid_definition();
        definition.concurrent_users = MAX_CONCURRENT_USERS;
        definition.duration_seconds = MAX_DURATION_SECONDS;
        assert!(validate_definition(&definition).is_ok());

        definition.concurrent_users = 1;
        definition.duration_seconds = 1;
        assert!(validate_definition(&definition).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut definition = valid_definition();
        definition.name = "  ".to_string();
        assert_eq!(validate_definition(&definition), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut definition = valid_definition();
        definition.concurrent_users = 0;
        assert_eq!(
            validate_definition(&definition),
            Err(ValidationError::ConcurrencyTooLow(0))
        );

        definition.concurrent_users = 1001;
        assert_eq!(
            validate_definition(&definition),
            Err(ValidationError::ConcurrencyTooHigh { actual: 1001, max: 1000 })
        );
    }

    #[test]
    fn test_duration_bounds() {
        let mut definition = valid_definition();
        definition.duration_seconds = -5;
        assert_eq!(
            validate_definition(&definition),
            Err(ValidationError::DurationTooShort(-5))
        );

        definition.duration_seconds = 3601;
        assert!(matches!(
            validate_definition(&definition),
            Err(ValidationError::DurationTooLong { actual: 3601, .. })
        ));
    }

    #[test]
    fn test_no_scenarios_rejected() {
        let mut definition = valid_definition();
        definition.scenarios.clear();
        assert_eq!(validate_definition(&definition), Err(ValidationError::NoScenarios));
    }

    #[test]
    fn test_scenario_rules() {
        let mut definition = valid_definition();
        definition.scenarios.push(Scenario::new("GET", ""));
        assert_eq!(
            validate_definition(&definition),
            Err(ValidationError::EmptyUrl { index: 1 })
        );

        definition.scenarios[1] = Scenario::new("", "http://localhost/");
        assert_eq!(
            validate_definition(&definition),
            Err(ValidationError::EmptyMethod { index: 1 })
        );

        definition.scenarios[1] = Scenario::new("GET", "http://localhost/").with_weight(-1);
        assert_eq!(
            validate_definition(&definition),
            Err(ValidationError::NegativeWeight { index: 1, weight: -1 })
        );
    }

    #[test]
    fn test_zero_weight_is_valid() {
        let mut definition = valid_definition();
        definition.scenarios[0].weight = 0;
        assert!(validate_definition(&definition).is_ok());
    }
}
