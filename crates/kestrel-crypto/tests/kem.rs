#![allow(clippy::unwrap_used)]

use std::{
    error::Error as _,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use kestrel_crypto::{
    constraints::{AlgorithmPattern, ConstraintPolicy, ConstraintRegistry, Mode, Purpose},
    csprng::SharedRandom,
    kem::{ClassicalKem, ProtocolState, SecretLengthMismatch, generate_keypair},
    prng::{ChaChaRandom, ReversedWindowGenerator},
    secret::SecretError,
    test_util::{CountingGenerator, Fault, XorKem, XorKemError, XorKey},
    EncapsulatedSecret, KemEngine, KemError, KemProtocol,
};
use test_log::test;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    Layer, Registry,
    layer::{Context, SubscriberExt},
};

const KEY: XorKey = XorKey([0xa5; 32]);

fn counting() -> SharedRandom {
    Arc::new(CountingGenerator::new())
}

#[derive(Clone, Default)]
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` and returns how many warnings it logged.
fn count_warnings(f: impl FnOnce()) -> usize {
    let counter = WarnCounter::default();
    tracing::subscriber::with_default(Registry::default().with(counter.clone()), f);
    counter.0.load(Ordering::SeqCst)
}

fn generate<E: KemEngine>(engine: E, pk: E::PublicKey, rng: SharedRandom) -> EncapsulatedSecret {
    let mut p = KemProtocol::new(engine);
    p.configure_generate(pk, "AES", rng).unwrap();
    p.run().unwrap()
}

fn extract<E: KemEngine>(engine: E, sk: E::PrivateKey, enc: &[u8]) -> EncapsulatedSecret {
    let mut p = KemProtocol::new(engine);
    p.configure_extract(sk, enc, "AES").unwrap();
    p.run().unwrap()
}

#[test]
fn test_xor_round_trip() {
    let sent = generate(XorKem::new(128), KEY, counting());
    let received = extract(XorKem::new(128), KEY, sent.encapsulation());
    assert_eq!(sent.secret().unwrap(), received.secret().unwrap());
    assert_eq!(sent.encapsulation(), received.encapsulation());
    assert_eq!(received.key_algorithm(), "AES");
}

#[test]
fn test_classical_round_trip() {
    let rng: SharedRandom = Arc::new(ChaChaRandom::from_seed([7; 32]));
    let (sk, pk) = generate_keypair(&*rng);
    let sent = generate(ClassicalKem, pk, Arc::clone(&rng));
    assert_eq!(sent.secret().unwrap().len(), ClassicalKem::SECRET_LEN);
    let received = extract(ClassicalKem, sk, sent.encapsulation());
    assert_eq!(sent.secret().unwrap(), received.secret().unwrap());
}

/// Randomness can come from a layered generator.
#[test]
fn test_round_trip_with_window() {
    let window = ReversedWindowGenerator::new(ChaChaRandom::from_seed([1; 32]), 16).unwrap();
    let rng: SharedRandom = Arc::new(window);
    let (sk, pk) = generate_keypair(&*rng);
    let sent = generate(ClassicalKem, pk, rng);
    let received = extract(ClassicalKem, sk, sent.encapsulation());
    assert_eq!(sent.secret().unwrap(), received.secret().unwrap());
}

#[test]
fn test_single_use() {
    let mut p = KemProtocol::new(XorKem::new(128));
    p.configure_generate(KEY, "AES", counting()).unwrap();
    let first = p.run().unwrap();
    let before = first.secret().unwrap().to_vec();

    let err = p.run().unwrap_err();
    assert!(
        matches!(err, KemError::InvalidState(ProtocolState::Completed)),
        "{err:?}"
    );
    assert_eq!(p.state(), ProtocolState::Completed);
    // The first result is untouched.
    assert!(!first.is_destroyed());
    assert_eq!(first.secret().unwrap(), before.as_slice());
}

#[test]
fn test_policy_violation() {
    let registry = ConstraintRegistry::new([ConstraintPolicy::new(
        AlgorithmPattern::prefix("XOR"),
        Purpose::KeyAgreement,
        128,
        Mode::Enforce,
    )]);
    let rng = Arc::new(CountingGenerator::new());

    let mut p = KemProtocol::with_registry(XorKem::new(80), &registry);
    p.configure_generate(KEY, "AES", rng.clone()).unwrap();
    let err = p.run().unwrap_err();
    match err {
        KemError::PolicyViolation(v) => {
            assert_eq!(v.algorithm, "XOR-KEM");
            assert_eq!(v.required, 128);
            assert_eq!(v.actual, 80);
        }
        err => panic!("unexpected error: {err:?}"),
    }
    assert_eq!(p.state(), ProtocolState::Failed);
    // The engine never ran.
    assert_eq!(rng.fills(), 0);

    // Running again does nothing.
    assert!(matches!(
        p.run(),
        Err(KemError::InvalidState(ProtocolState::Failed))
    ));

    let mut p = KemProtocol::with_registry(XorKem::new(128), &registry);
    p.configure_generate(KEY, "AES", rng).unwrap();
    p.run().unwrap();
}

#[test]
fn test_warn_policy_permits() {
    let registry = ConstraintRegistry::new([ConstraintPolicy::new(
        AlgorithmPattern::Any,
        Purpose::KeyAgreement,
        128,
        Mode::Warn,
    )]);
    let warnings = count_warnings(|| {
        let mut p = KemProtocol::with_registry(XorKem::new(80), &registry);
        p.configure_generate(KEY, "AES", counting()).unwrap();
        p.run().unwrap();
    });
    assert_eq!(warnings, 1);

    let warnings = count_warnings(|| {
        let mut p = KemProtocol::with_registry(XorKem::new(128), &registry);
        p.configure_generate(KEY, "AES", counting()).unwrap();
        p.run().unwrap();
    });
    assert_eq!(warnings, 0);
}

#[test]
fn test_extract_skips_policy() {
    let registry = ConstraintRegistry::legacy_use(256);
    let mut p = KemProtocol::with_registry(XorKem::new(80), &registry);
    p.configure_extract(KEY, [0u8; 32], "AES").unwrap();
    assert!(p.run().is_ok());
}

#[test]
fn test_engine_failure() {
    for fault in [Fault::Generate, Fault::Extract] {
        let mut p = KemProtocol::new(XorKem::new(128).with_fault(fault));
        let configured = match fault {
            Fault::Generate => p.configure_generate(KEY, "AES", counting()),
            _ => p.configure_extract(KEY, [0u8; 32], "AES"),
        };
        configured.unwrap();
        let err = p.run().unwrap_err();
        assert!(matches!(err, KemError::EngineFailure(_)), "{err:?}");
        let source = err.source().unwrap();
        assert!(
            matches!(
                source.downcast_ref::<XorKemError>(),
                Some(XorKemError::Injected(f)) if *f == fault
            ),
            "{source:?}"
        );
        assert_eq!(p.state(), ProtocolState::Failed);
    }
}

#[test]
fn test_short_secret() {
    let mut p = KemProtocol::new(XorKem::new(128).with_fault(Fault::ShortSecret));
    p.configure_extract(KEY, [0u8; 32], "AES").unwrap();
    let err = p.run().unwrap_err();
    let source = err.source().unwrap();
    assert_eq!(
        source.downcast_ref::<SecretLengthMismatch>(),
        Some(&SecretLengthMismatch {
            expected: 32,
            actual: 31,
        })
    );

    let mut p = KemProtocol::new(XorKem::new(128).with_fault(Fault::ShortSecret));
    p.configure_generate(KEY, "AES", counting()).unwrap();
    assert!(matches!(p.run(), Err(KemError::EngineFailure(_))));
    assert_eq!(p.state(), ProtocolState::Failed);
}

#[test]
fn test_bad_encapsulation() {
    let mut p = KemProtocol::new(XorKem::new(128));
    p.configure_extract(KEY, [0u8; 7], "AES").unwrap();
    let err = p.run().unwrap_err();
    assert!(matches!(
        err.source().and_then(|e| e.downcast_ref::<XorKemError>()),
        Some(XorKemError::InvalidEncapsulation(7))
    ));
}

#[test]
fn test_destroy_once() {
    let mut sent = generate(XorKem::new(128), KEY, counting());
    sent.destroy();
    assert_eq!(sent.secret(), Err(SecretError::Destroyed));
    sent.destroy();
    assert_eq!(sent.secret(), Err(SecretError::Destroyed));
    assert_eq!(sent.encapsulation().len(), 32);
}

#[test]
fn test_with_secret() {
    let sent = generate(XorKem::new(128), KEY, counting());
    let enc = sent.encapsulation().to_vec();
    let first = sent.with_secret(|s| s[0]).unwrap();
    assert_eq!(first, 0);

    let received = extract(XorKem::new(128), KEY, &enc);
    let len = received.with_secret(<[u8]>::len).unwrap();
    assert_eq!(len, 32);
}

#[test]
fn test_crate_error() {
    fn run() -> Result<(), kestrel_crypto::Error> {
        let mut p = KemProtocol::new(XorKem::new(128));
        p.run()?;
        Ok(())
    }
    assert!(matches!(run(), Err(kestrel_crypto::Error::Kem(_))));
}
