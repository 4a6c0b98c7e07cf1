//! A panic raised while the panic hook is running aborts the process, so a
//! misbehaving presenter must not be allowed to do that

mod shared;

#[test]
fn survives_panicking_presenter() {
    let previous = shared::custom_hook();
    let installed = shared::install(false, shared::Presentation::Panic);

    shared::panic_on_thread(shared::SadnessFlavor::OutOfBounds);

    // The report was already persisted before the presenter ran
    let artifacts = installed.artifacts();
    assert_eq!(artifacts.len(), 1);
    assert!(
        artifacts[0].trace.lines()[0]
            .contains(shared::SadnessFlavor::OutOfBounds.expected_message())
    );

    assert!(installed.presented.lock().is_empty());
    assert_eq!(installed.terminations(), 0);

    // Handling failed, so the fault is handed to the previous hook, but the
    // presenter's own panic is not
    let previous = previous.lock();
    assert_eq!(previous.len(), 1);
    assert!(previous[0].contains(shared::SadnessFlavor::OutOfBounds.expected_message()));
}
