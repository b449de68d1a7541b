use crate::config::FetchConfig;
use crate::fetch::pacing::random_between;
use crate::fetch::{BrowserSession, FetchError, Interaction};
use rand::Rng;
use tracing::debug;

/// One scripted step of simulated reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Scroll(i32),
    Mouse(u32, u32),
    LoadMore,
}

/// Plans the interaction for one page view
///
/// Standard views scroll a few screens with a stray mouse move; exhaustive
/// views scroll much further and press "load more" between scrolls.
fn plan(interaction: Interaction, viewport: (u32, u32)) -> Vec<Step> {
    let mut rng = rand::thread_rng();
    let (width, height) = viewport;

    let scrolls = match interaction {
        Interaction::Standard => rng.gen_range(2..=4),
        Interaction::Exhaustive => rng.gen_range(8..=12),
    };

    let mut steps = Vec::new();
    for i in 0..scrolls {
        let dy = (height as f64 * rng.gen_range(0.4..0.9)) as i32;
        steps.push(Step::Scroll(dy));
        if rng.gen_bool(0.5) {
            steps.push(Step::Mouse(
                rng.gen_range(0..width.max(1)),
                rng.gen_range(0..height.max(1)),
            ));
        }
        if interaction == Interaction::Exhaustive && i % 3 == 2 {
            steps.push(Step::LoadMore);
        }
    }
    steps
}

/// Scrolls, moves the mouse and clicks through the current page
///
/// Pauses between steps are drawn from the configured range. The caller
/// treats any error as non-fatal.
pub async fn simulate(
    session: &mut dyn BrowserSession,
    config: &FetchConfig,
    interaction: Interaction,
    viewport: (u32, u32),
) -> Result<(), FetchError> {
    let steps = plan(interaction, viewport);
    debug!("Simulating {} interaction steps", steps.len());

    for step in steps {
        match step {
            Step::Scroll(dy) => session.scroll_by(dy).await?,
            Step::Mouse(x, y) => session.move_mouse(x, y).await?,
            Step::LoadMore => {
                if session.click_load_more().await? {
                    debug!("Clicked load-more control");
                }
            }
        }
        tokio::time::sleep(random_between(
            config.human_pause_min_ms,
            config.human_pause_max_ms,
        ))
        .await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan_is_short() {
        let steps = plan(Interaction::Standard, (1280, 800));
        let scrolls = steps.iter().filter(|s| matches!(s, Step::Scroll(_))).count();
        assert!((2..=4).contains(&scrolls));
        assert!(!steps.contains(&Step::LoadMore));
    }

    #[test]
    fn test_exhaustive_plan_loads_more() {
        let steps = plan(Interaction::Exhaustive, (1280, 800));
        let scrolls = steps.iter().filter(|s| matches!(s, Step::Scroll(_))).count();
        assert!((8..=12).contains(&scrolls));
        assert!(steps.contains(&Step::LoadMore));
    }

    #[test]
    fn test_steps_stay_inside_viewport() {
        for step in plan(Interaction::Exhaustive, (390, 844)) {
            match step {
                Step::Scroll(dy) => assert!(dy > 0 && dy < 844),
                Step::Mouse(x, y) => assert!(x < 390 && y < 844),
                Step::LoadMore => {}
            }
        }
    }
}
