use super::*;
use crate::animation::AnimationOutcome;
use crate::container::{Container, TaskFragmentInfo};
use crate::geometry::{Position, Size};
use crate::mock::{ImmediateAnimationFactory, ManualAnimationFactory, MockHost};
use crate::surface::{CommandTransaction, SurfaceCommand};

const HOST_BOUNDS: Bounds = Bounds {
    position: Position { x: 0, y: 0 },
    size: Size {
        width: 1000,
        height: 2000,
    },
};

fn dimmer_with(settings: DimmerSettings) -> (Dimmer<MockHost>, ManualAnimationFactory) {
    let animations = ManualAnimationFactory::new();
    let dimmer = Dimmer::with_settings(
        MockHost::new(HOST_BOUNDS),
        Box::new(animations.clone()),
        settings,
    );
    (dimmer, animations)
}

fn new_dimmer() -> (Dimmer<MockHost>, ManualAnimationFactory) {
    dimmer_with(DimmerSettings::default())
}

fn child(name: &str, surface: u64) -> Container {
    Container::new(name, Bounds::new(0, 0, 100, 300)).with_surface(SurfaceHandle(surface))
}

/// One full pass with a single requester that also owns the position.
fn dim_pass(
    dimmer: &mut Dimmer<MockHost>,
    requester: &Container,
    alpha: f32,
    blur: i32,
) -> CommandTransaction {
    dimmer.reset_dim_states();
    dimmer.adjust_appearance(requester, alpha, blur);
    dimmer.adjust_position(requester, requester);
    let mut t = CommandTransaction::new();
    dimmer.update_dims(&mut t);
    t
}

fn empty_pass(dimmer: &mut Dimmer<MockHost>) -> CommandTransaction {
    dimmer.reset_dim_states();
    let mut t = CommandTransaction::new();
    dimmer.update_dims(&mut t);
    t
}

fn finish(dimmer: &mut Dimmer<MockHost>, animations: &ManualAnimationFactory) -> CommandTransaction {
    animations.finish_all(AnimationOutcome::Completed);
    let mut t = CommandTransaction::new();
    dimmer.process_animation_events(&mut t);
    t
}

fn count_removes(t: &CommandTransaction) -> usize {
    t.count(|c| matches!(c, SurfaceCommand::Remove { .. }))
}

fn count_shows(t: &CommandTransaction) -> usize {
    t.count(|c| matches!(c, SurfaceCommand::Show { .. }))
}

#[test]
fn test_dim_above_child() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    let t = dim_pass(&mut dimmer, &child, 1.0, 0);
    let dim = dimmer.get_dim_layer().unwrap();

    assert_eq!(dimmer.host().created(), &[dim]);
    assert!(t.contains(&SurfaceCommand::Show { surface: dim }));
    assert!(t.contains(&SurfaceCommand::SetRelativeLayer {
        surface: dim,
        relative_to: SurfaceHandle(1),
        z: -1,
    }));
    assert!(t.contains(&SurfaceCommand::SetWindowCrop {
        surface: dim,
        width: 1000,
        height: 2000,
    }));

    let started = animations.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].surface, dim);
    assert_eq!(started[0].spec.from_alpha, 0.0);
    assert_eq!(started[0].spec.to_alpha, 1.0);
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Enter));
}

#[test]
fn test_no_request_creates_nothing() {
    let (mut dimmer, animations) = new_dimmer();

    let t = empty_pass(&mut dimmer);

    assert!(t.is_empty());
    assert!(dimmer.get_dim_layer().is_none());
    assert!(dimmer.host().created().is_empty());
    assert_eq!(animations.start_count(), 0);
}

#[test]
fn test_zero_request_creates_nothing() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    let t = dim_pass(&mut dimmer, &child, 0.0, 0);

    assert!(t.is_empty());
    assert!(dimmer.get_dim_layer().is_none());
    assert!(dimmer.host().created().is_empty());
    assert_eq!(animations.start_count(), 0);
}

#[test]
fn test_surface_created_on_adjust() {
    let (mut dimmer, _) = new_dimmer();
    let child = child("child", 1);

    assert!(dimmer.get_dim_layer().is_none());
    dimmer.adjust_appearance(&child, 0.3, 0);
    assert!(dimmer.get_dim_layer().is_some());
}

#[test]
fn test_unchanged_request_is_noop() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.5, 20);
    finish(&mut dimmer, &animations);

    let t = dim_pass(&mut dimmer, &child, 0.5, 20);
    assert!(t.is_empty(), "unexpected commands: {:?}", t.commands());
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_repeated_update_is_noop() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    let first = dim_pass(&mut dimmer, &child, 0.5, 0);
    assert_eq!(count_shows(&first), 1);

    let mut second = CommandTransaction::new();
    dimmer.update_dims(&mut second);
    assert!(second.is_empty());
    assert_eq!(animations.start_count(), 1);

    // Same once the dim is gone
    dimmer.dont_animate_exit();
    let removed = empty_pass(&mut dimmer);
    assert_eq!(count_removes(&removed), 1);
    let mut again = CommandTransaction::new();
    dimmer.update_dims(&mut again);
    assert!(again.is_empty());
}

#[test]
fn test_remove_dim_with_exit_animation() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 1.0, 0);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();

    let t = empty_pass(&mut dimmer);
    assert_eq!(count_removes(&t), 0);
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Exit));
    let exit = animations.started()[1];
    assert_eq!(exit.spec.from_alpha, 1.0);
    assert_eq!(exit.spec.to_alpha, 0.0);

    // Another empty pass while fading out changes nothing
    assert!(empty_pass(&mut dimmer).is_empty());

    let t = finish(&mut dimmer, &animations);
    assert_eq!(t.commands(), &[SurfaceCommand::Remove { surface: dim }]);
    assert!(dimmer.get_dim_layer().is_none());
}

#[test]
fn test_exit_starts_from_shown_alpha() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 1.0, 0);
    animations.set_displayed_alpha(0.25);

    empty_pass(&mut dimmer);
    let started = animations.started();
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Exit));
    assert_eq!(animations.cancelled(), vec![started[0].token]);
    assert_eq!(started[1].spec.from_alpha, 0.25);
    assert!(started[1].spec.from_alpha < started[0].spec.to_alpha);
}

#[test]
fn test_handover_starts_from_shown_alpha() {
    let (mut dimmer, animations) = new_dimmer();
    let first = child("first", 1);
    let second = child("second", 2);

    dim_pass(&mut dimmer, &first, 0.8, 0);
    animations.set_displayed_alpha(0.3);
    dim_pass(&mut dimmer, &second, 0.5, 0);

    let handover = animations.started()[1];
    assert_eq!(handover.spec.from_alpha, 0.3);
    assert_eq!(handover.spec.to_alpha, 0.5);
}

#[test]
fn test_remove_dim_without_animation() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 1.0, 0);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();
    animations.clear_history();

    dimmer.dont_animate_exit();
    let t = empty_pass(&mut dimmer);

    assert_eq!(t.commands(), &[SurfaceCommand::Remove { surface: dim }]);
    assert_eq!(animations.start_count(), 0);
    assert!(dimmer.get_dim_layer().is_none());
}

#[test]
fn test_dont_animate_exit_is_per_surface() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 1.0, 0);
    dimmer.dont_animate_exit();
    empty_pass(&mut dimmer);
    assert!(dimmer.get_dim_layer().is_none());

    dim_pass(&mut dimmer, &child, 1.0, 0);
    finish(&mut dimmer, &animations);
    empty_pass(&mut dimmer);
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Exit));
}

#[test]
fn test_exit_animation_disabled_in_settings() {
    let (mut dimmer, animations) = dimmer_with(DimmerSettings {
        animate_exit: false,
        ..DimmerSettings::default()
    });
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 1.0, 0);
    finish(&mut dimmer, &animations);
    let t = empty_pass(&mut dimmer);

    assert_eq!(count_removes(&t), 1);
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_handover_forces_animation() {
    let (mut dimmer, animations) = new_dimmer();
    let first = child("first", 1);
    let second = child("second", 2);

    dim_pass(&mut dimmer, &first, 0.5, 0);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();

    let t = dim_pass(&mut dimmer, &second, 0.5, 0);

    assert_eq!(animations.start_count(), 2);
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Handover));
    assert_eq!(count_shows(&t), 0);
    assert!(!t.contains(&SurfaceCommand::SetAlpha {
        surface: dim,
        alpha: 0.5
    }));
    assert!(t.contains(&SurfaceCommand::SetRelativeLayer {
        surface: dim,
        relative_to: SurfaceHandle(2),
        z: -1,
    }));
    assert_eq!(dimmer.get_dim_layer(), Some(dim));
}

#[test]
fn test_consecutive_handovers() {
    let (mut dimmer, animations) = new_dimmer();
    let first = child("first", 1);
    let second = child("second", 2);

    dim_pass(&mut dimmer, &first, 0.2, 0);
    dim_pass(&mut dimmer, &second, 0.2, 0);

    let started = animations.started();
    assert_eq!(started.len(), 2);
    assert_eq!(animations.cancelled(), vec![started[0].token]);
    assert_eq!(started[1].spec.from_alpha, 0.2);
    assert_eq!(started[1].spec.to_alpha, 0.2);
}

#[test]
fn test_self_driven_change_is_direct() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.5, 10);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();

    let t = dim_pass(&mut dimmer, &child, 0.6, 20);

    assert_eq!(animations.start_count(), 1);
    assert_eq!(
        t.commands(),
        &[
            SurfaceCommand::SetAlpha {
                surface: dim,
                alpha: 0.6
            },
            SurfaceCommand::SetBackgroundBlurRadius {
                surface: dim,
                radius: 20
            },
        ]
    );
}

#[test]
fn test_self_driven_change_cancels_enter() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.5, 0);
    let enter = animations.started()[0].token;
    assert!(dimmer.is_animating());

    let t = dim_pass(&mut dimmer, &child, 0.7, 0);

    assert!(!dimmer.is_animating());
    assert_eq!(animations.cancelled(), vec![enter]);
    assert_eq!(t.last_alpha(dimmer.get_dim_layer().unwrap()), Some(0.7));
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_self_driven_close_removes_once() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.5, 0);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();

    let t = dim_pass(&mut dimmer, &child, 0.0, 0);

    assert_eq!(count_removes(&t), 1);
    assert_eq!(t.last_alpha(dim), Some(0.0));
    assert!(dimmer.get_dim_layer().is_none());
    assert!(empty_pass(&mut dimmer).is_empty());
}

#[test]
fn test_handover_to_zero_removes_after_animation() {
    let (mut dimmer, animations) = new_dimmer();
    let first = child("first", 1);
    let second = child("second", 2);

    dim_pass(&mut dimmer, &first, 0.5, 0);
    finish(&mut dimmer, &animations);

    let t = dim_pass(&mut dimmer, &second, 0.0, 0);
    assert_eq!(count_removes(&t), 0);
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Handover));

    let t = finish(&mut dimmer, &animations);
    assert_eq!(count_removes(&t), 1);
    assert!(dimmer.get_dim_layer().is_none());
}

#[test]
fn test_last_request_wins() {
    let (mut dimmer, animations) = new_dimmer();
    let first = child("first", 1);
    let second = child("second", 2);

    dimmer.reset_dim_states();
    dimmer.adjust_appearance(&first, 0.5, 0);
    dimmer.adjust_position(&first, &first);
    dimmer.adjust_appearance(&second, 0.9, 0);
    dimmer.adjust_position(&second, &second);
    let mut t = CommandTransaction::new();
    dimmer.update_dims(&mut t);

    let started = animations.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].spec.to_alpha, 0.9);
    assert_eq!(t.count(|c| matches!(c, SurfaceCommand::SetAlpha { alpha, .. } if *alpha == 0.5)), 0);
    assert!(!t.contains(&SurfaceCommand::SetRelativeLayer {
        surface: dimmer.get_dim_layer().unwrap(),
        relative_to: SurfaceHandle(1),
        z: -1,
    }));

    // The second requester now owns the dim, so it may drive it directly
    finish(&mut dimmer, &animations);
    dim_pass(&mut dimmer, &second, 0.8, 0);
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_completion_writes_target_alpha() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.4, 0);
    let dim = dimmer.get_dim_layer().unwrap();

    let t = finish(&mut dimmer, &animations);
    assert_eq!(t.commands(), &[SurfaceCommand::SetAlpha { surface: dim, alpha: 0.4 }]);
    assert!(!dimmer.is_animating());
}

#[test]
fn test_aborted_animation_applies_target() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.4, 0);
    let dim = dimmer.get_dim_layer().unwrap();
    animations.finish_all(AnimationOutcome::Aborted);

    let mut t = CommandTransaction::new();
    assert_eq!(dimmer.process_animation_events(&mut t), 1);
    assert_eq!(t.last_alpha(dim), Some(0.4));
    assert!(!dimmer.is_animating());
}

#[test]
fn test_completions_drained_by_update() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.4, 0);
    animations.finish_all(AnimationOutcome::Completed);

    let t = dim_pass(&mut dimmer, &child, 0.4, 0);
    assert_eq!(t.last_alpha(dimmer.get_dim_layer().unwrap()), Some(0.4));
    assert!(!dimmer.is_animating());
}

#[test]
fn test_stale_completion_ignored() {
    let (mut dimmer, animations) = new_dimmer();
    let first = child("first", 1);
    let second = child("second", 2);

    dim_pass(&mut dimmer, &first, 0.5, 0);
    dim_pass(&mut dimmer, &second, 0.3, 0);

    // The cancelled enter reported Aborted and was ignored
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Handover));
    assert_eq!(animations.pending_count(), 1);

    let mut t = CommandTransaction::new();
    assert_eq!(dimmer.process_animation_events(&mut t), 0);
    assert!(t.is_empty());
}

#[test]
fn test_reenter_during_exit() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.6, 0);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();
    empty_pass(&mut dimmer);
    let exit = animations.started()[1].token;

    let t = dim_pass(&mut dimmer, &child, 0.6, 0);

    assert_eq!(count_removes(&t), 0);
    assert_eq!(count_shows(&t), 0);
    assert_eq!(dimmer.get_dim_layer(), Some(dim));
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Enter));
    assert_eq!(animations.cancelled(), vec![exit]);
    let enter = animations.started()[2];
    assert_eq!(enter.spec.from_alpha, 0.6);
    assert_eq!(enter.spec.to_alpha, 0.6);

    let t = finish(&mut dimmer, &animations);
    assert_eq!(count_removes(&t), 0);
    assert_eq!(t.last_alpha(dim), Some(0.6));
}

#[test]
fn test_synchronous_adapter_lands_in_same_transaction() {
    let animations = ImmediateAnimationFactory::new(AnimationOutcome::Completed);
    let mut dimmer = Dimmer::new(MockHost::new(HOST_BOUNDS), Box::new(animations.clone()));
    let child = child("child", 1);

    let t = dim_pass(&mut dimmer, &child, 0.5, 0);
    let dim = dimmer.get_dim_layer().unwrap();
    assert_eq!(t.last_alpha(dim), Some(0.5));
    assert!(!dimmer.is_animating());

    let t = empty_pass(&mut dimmer);
    assert_eq!(count_removes(&t), 1);
    assert!(dimmer.get_dim_layer().is_none());
    assert_eq!(animations.start_count(), 2);
}

#[test]
fn test_surface_creation_failure() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);
    dimmer.host_mut().fail_creation = true;

    let t = dim_pass(&mut dimmer, &child, 0.5, 0);
    assert!(t.is_empty());
    assert!(dimmer.get_dim_layer().is_none());
    assert_eq!(animations.start_count(), 0);

    dimmer.host_mut().fail_creation = false;
    let t = dim_pass(&mut dimmer, &child, 0.5, 0);
    assert_eq!(count_shows(&t), 1);
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_blur_only_dim() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    let t = dim_pass(&mut dimmer, &child, 0.0, 50);
    let dim = dimmer.get_dim_layer().unwrap();

    assert!(t.contains(&SurfaceCommand::SetBackgroundBlurRadius {
        surface: dim,
        radius: 50
    }));
    assert_eq!(animations.started()[0].spec.to_alpha, 0.0);
    finish(&mut dimmer, &animations);
    assert_eq!(dimmer.get_dim_layer(), Some(dim));
}

#[test]
fn test_clamped_values() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    let t = dim_pass(&mut dimmer, &child, 1.7, -5);

    assert_eq!(animations.started()[0].spec.to_alpha, 1.0);
    assert_eq!(
        t.count(|c| matches!(c, SurfaceCommand::SetBackgroundBlurRadius { .. })),
        0
    );
}

#[test]
fn test_bounds_follow_host_resize() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.5, 0);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();

    dimmer.host_mut().bounds = Bounds::new(10, 20, 500, 600);
    let t = dim_pass(&mut dimmer, &child, 0.5, 0);

    assert_eq!(
        t.commands(),
        &[
            SurfaceCommand::SetWindowCrop {
                surface: dim,
                width: 500,
                height: 600
            },
            SurfaceCommand::SetPosition {
                surface: dim,
                x: 0,
                y: 0
            },
        ]
    );
    assert_eq!(dimmer.get_dim_bounds(), Bounds::new(10, 20, 500, 600));
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_per_container_bounds() {
    let (mut dimmer, _) = dimmer_with(DimmerSettings {
        mode: DimMode::PerContainer,
        ..DimmerSettings::default()
    });
    let task = Bounds::new(10, 10, 500, 500);
    let child = Container::new("child", Bounds::new(60, 110, 200, 100))
        .with_surface(SurfaceHandle(1))
        .in_task(task);

    let t = dim_pass(&mut dimmer, &child, 0.5, 0);
    let dim = dimmer.get_dim_layer().unwrap();

    assert_eq!(dimmer.get_dim_bounds(), Bounds::new(60, 110, 200, 100));
    assert!(t.contains(&SurfaceCommand::SetPosition {
        surface: dim,
        x: 50,
        y: 100
    }));
}

#[test]
fn test_dim_bounds_in_embedded_fragment() {
    let (mut dimmer, _) = new_dimmer();
    let task = Bounds::from_ltrb(10, 0, 50, 40);
    let left = Bounds::from_ltrb(10, 0, 30, 40);
    let right = Bounds::from_ltrb(30, 0, 50, 40);
    let fragment = |bounds| TaskFragmentInfo {
        bounds,
        embedded: true,
        dims_on_parent_task: false,
    };

    let left_child = Container::new("left", left)
        .with_surface(SurfaceHandle(1))
        .in_task(task)
        .in_fragment(fragment(left));
    dim_pass(&mut dimmer, &left_child, 0.5, 0);
    assert_eq!(dimmer.get_dim_bounds(), left);

    let right_child = Container::new("right", right)
        .with_surface(SurfaceHandle(2))
        .in_task(task)
        .in_fragment(fragment(right));
    let t = dim_pass(&mut dimmer, &right_child, 0.5, 0);
    let dim = dimmer.get_dim_layer().unwrap();
    assert_eq!(dimmer.get_dim_bounds(), right);
    assert!(t.contains(&SurfaceCommand::SetPosition {
        surface: dim,
        x: 20,
        y: 0
    }));

    let parent_dimming = Container::new("parent", right)
        .with_surface(SurfaceHandle(3))
        .in_task(task)
        .in_fragment(TaskFragmentInfo {
            dims_on_parent_task: true,
            ..fragment(right)
        });
    dim_pass(&mut dimmer, &parent_dimming, 0.5, 0);
    assert_eq!(dimmer.get_dim_bounds(), task);
}

#[test]
fn test_position_owner_differs_from_requester() {
    let (mut dimmer, _) = dimmer_with(DimmerSettings {
        mode: DimMode::PerContainer,
        ..DimmerSettings::default()
    });
    let requester = child("requester", 1);
    let owner = Container::new("owner", Bounds::new(5, 5, 50, 50)).with_surface(SurfaceHandle(2));

    dimmer.reset_dim_states();
    dimmer.adjust_appearance(&requester, 0.5, 0);
    dimmer.adjust_position(&owner, &requester);
    let mut t = CommandTransaction::new();
    dimmer.update_dims(&mut t);
    let dim = dimmer.get_dim_layer().unwrap();

    assert_eq!(dimmer.get_dim_bounds(), Bounds::new(5, 5, 50, 50));
    assert!(t.contains(&SurfaceCommand::SetRelativeLayer {
        surface: dim,
        relative_to: SurfaceHandle(1),
        z: -1,
    }));
}

#[test]
fn test_update_without_reset() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dimmer.adjust_appearance(&child, 0.5, 0);
    let mut t = CommandTransaction::new();
    dimmer.update_dims(&mut t);

    assert!(dimmer.get_dim_layer().is_some());
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_adjust_after_update_without_reset() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.5, 0);
    finish(&mut dimmer, &animations);
    let dim = dimmer.get_dim_layer().unwrap();

    // Out of contract: no reset_dim_states before the next adjust
    dimmer.adjust_appearance(&child, 0.9, 0);
    dimmer.adjust_position(&child, &child);
    let mut t = CommandTransaction::new();
    dimmer.update_dims(&mut t);

    assert_eq!(t.last_alpha(dim), Some(0.9));
    assert_eq!(dimmer.get_dim_layer(), Some(dim));
    assert_eq!(animations.start_count(), 1);
}

#[test]
fn test_dim_bounds_cleared_on_removal() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child", 1);

    dim_pass(&mut dimmer, &child, 0.5, 0);
    assert_eq!(dimmer.get_dim_bounds(), HOST_BOUNDS);

    empty_pass(&mut dimmer);
    assert_eq!(dimmer.get_dim_bounds(), HOST_BOUNDS);
    finish(&mut dimmer, &animations);

    assert!(dimmer.get_dim_layer().is_none());
    assert_eq!(dimmer.get_dim_bounds(), Bounds::default());
}

#[test]
fn test_teardown_scenario() {
    let (mut dimmer, animations) = new_dimmer();
    let child = child("child1", 1);

    let t = dim_pass(&mut dimmer, &child, 0.7, 50);
    let dim = dimmer.get_dim_layer().unwrap();
    assert!(t.contains(&SurfaceCommand::SetBackgroundBlurRadius {
        surface: dim,
        radius: 50
    }));
    assert_eq!(animations.started()[0].spec.to_alpha, 0.7);

    let t = empty_pass(&mut dimmer);
    assert_eq!(count_removes(&t), 0);
    assert_eq!(dimmer.running_animation(), Some(DimAnimationKind::Exit));
    let exit = animations.started()[1];
    assert_eq!(exit.spec.from_alpha, 0.7);

    let t = finish(&mut dimmer, &animations);
    assert_eq!(count_removes(&t), 1);
    assert!(dimmer.get_dim_layer().is_none());
}
