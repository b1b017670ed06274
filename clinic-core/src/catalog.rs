use clinic_types::{
    CaseStage, Choice, Difficulty, MedicalImage, PatientCase, TrustedSource, Vitals,
};
use uuid::Uuid;

fn choice(id: &str, label: &str, feedback: &str) -> Choice {
    Choice {
        id: id.to_string(),
        label: label.to_string(),
        feedback: feedback.to_string(),
    }
}

fn stage(id: &str, dialogue: &str, correct_choice_id: &str, choices: Vec<Choice>) -> CaseStage {
    CaseStage {
        id: id.to_string(),
        dialogue: dialogue.to_string(),
        choices,
        correct_choice_id: correct_choice_id.to_string(),
    }
}

fn vitals(temp: &str, bp: &str, hr: &str) -> Vitals {
    Vitals {
        temp: temp.to_string(),
        bp: bp.to_string(),
        hr: hr.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sources(items: &[(&str, &str)]) -> Vec<TrustedSource> {
    items
        .iter()
        .map(|(title, url)| TrustedSource {
            title: title.to_string(),
            url: url.to_string(),
        })
        .collect()
}

struct Patient<'a> {
    id: &'a str,
    name: &'a str,
    age: u32,
    occupation: &'a str,
    avatar_seed: &'a str,
    difficulty: Difficulty,
}

impl Patient<'_> {
    #[allow(clippy::too_many_arguments)]
    fn case(
        self,
        stages: Vec<CaseStage>,
        symptoms: &[&str],
        vitals: Vitals,
        diagnosis: &str,
        explanation: &str,
        trusted: &[(&str, &str)],
    ) -> PatientCase {
        PatientCase {
            id: self.id.to_string(),
            difficulty: self.difficulty,
            stages,
            name: self.name.to_string(),
            age: self.age,
            occupation: self.occupation.to_string(),
            avatar_seed: self.avatar_seed.to_string(),
            image_url: None,
            medical_images: Vec::<MedicalImage>::new(),
            symptoms: strings(symptoms),
            vitals,
            diagnosis: diagnosis.to_string(),
            medical_explanation: explanation.to_string(),
            trusted_sources: sources(trusted),
            stats: None,
            is_fallback: false,
        }
    }
}

/// Hand-authored cases that ship with the game.
pub fn permanent_cases() -> Vec<PatientCase> {
    vec![
        Patient {
            id: "perm_001",
            name: "Oliver",
            age: 8,
            occupation: "Treehouse Architect",
            avatar_seed: "Oliver",
            difficulty: Difficulty::Beginner,
        }
        .case(
            vec![stage(
                "s1",
                "Dr. Cutie! I was building my fortress and now I'm super itchy! Did the squirrels attack me with invisible lasers?",
                "c1",
                vec![
                    choice("c1", "Calamine lotion & rest", "Spot on! That will soothe the itch."),
                    choice("c2", "Antibiotics", "It's a virus, so antibiotics won't fight the laser squirrels!"),
                    choice("c3", "Ice bath", "Brrr! Too cold and not necessary."),
                ],
            )],
            &["Itchy red bumps", "Mild fever", "Tiredness"],
            vitals("37.8°C", "100/60", "85 bpm"),
            "Chickenpox (Varicella)",
            "Chickenpox is a highly contagious infection caused by the varicella-zoster virus. It causes an itchy, blister-like rash. While uncomfortable, it's very common in kids!",
            &[
                ("CDC - Chickenpox", "https://www.cdc.gov/chickenpox/index.html"),
                ("Mayo Clinic", "https://www.mayoclinic.org/diseases-conditions/chickenpox/symptoms-causes/syc-20351282"),
            ],
        ),
        Patient {
            id: "perm_002",
            name: "Luna",
            age: 22,
            occupation: "Stargazer",
            avatar_seed: "Luna",
            difficulty: Difficulty::Beginner,
        }
        .case(
            vec![stage(
                "s1",
                "H-h-achoo! Sorry, Doctor. I went to the flower field to watch the meteor shower and now I can't stop sneezing!",
                "c1",
                vec![
                    choice("c1", "Antihistamines", "Correct! That should block the histamine reaction."),
                    choice("c2", "Full body cast", "That seems a bit restrictive for a runny nose!"),
                    choice("c3", "Surgery", "We don't need to operate on a sneeze!"),
                ],
            )],
            &["Sneezing", "Runny nose", "Itchy eyes"],
            vitals("37.0°C", "115/75", "78 bpm"),
            "Allergic Rhinitis (Hay Fever)",
            "Allergic rhinitis occurs when your immune system overreacts to particles in the air that you breathe. It attacks particles like pollen or dust.",
            &[
                ("MedlinePlus - Allergic Rhinitis", "https://medlineplus.gov/ency/article/000813.htm"),
                ("AAAAI - Hay Fever", "https://www.aaaai.org/conditions-treatments/allergies/hay-fever"),
            ],
        ),
        Patient {
            id: "perm_003",
            name: "Barnaby",
            age: 45,
            occupation: "Professional Bear Hugger",
            avatar_seed: "Barnaby",
            difficulty: Difficulty::Beginner,
        }
        .case(
            vec![stage(
                "s1",
                "Doc, it hurts to swallow my honey tea. Even growling hurts! Can you take a look?",
                "c1",
                vec![
                    choice("c1", "Antibiotics (Penicillin)", "Exactly right. Since it's bacterial, this will help."),
                    choice("c2", "More honey", "Honey is soothing, but won't cure the bacteria."),
                    choice("c3", "Shouting therapy", "That will definitely make it worse!"),
                ],
            )],
            &["Sore throat", "Pain when swallowing", "Swollen glands"],
            vitals("38.5°C", "125/80", "88 bpm"),
            "Strep Throat",
            "Strep throat is a bacterial infection that can make your throat feel sore and scratchy. Strep throat accounts for only a small portion of sore throats.",
            &[(
                "CDC - Strep Throat",
                "https://www.cdc.gov/groupastrep/diseases-public/strep-throat.html",
            )],
        ),
        Patient {
            id: "perm_004",
            name: "Pixel",
            age: 19,
            occupation: "Esports Athlete",
            avatar_seed: "Pixel",
            difficulty: Difficulty::Beginner,
        }
        .case(
            vec![stage(
                "s1",
                "GGs, Doc. My APM is dropping because my hand feels all tingly and numb. I can't click heads like this!",
                "c1",
                vec![
                    choice("c1", "Wrist splint & breaks", "Perfect. Resting the nerve is key."),
                    choice("c2", "Play more games", "No! You need to rest that wrist."),
                    choice("c3", "Heavy weightlifting", "That might put more strain on it right now."),
                ],
            )],
            &["Wrist pain", "Numbness in fingers", "Weak grip"],
            vitals("36.8°C", "110/70", "70 bpm"),
            "Carpal Tunnel Syndrome",
            "Carpal tunnel syndrome is a condition that causes numbness, tingling, or weakness in your hand. It happens because of pressure on your median nerve, which runs the length of your arm.",
            &[(
                "NINDS - Carpal Tunnel",
                "https://www.ninds.nih.gov/health-information/disorders/carpal-tunnel-syndrome",
            )],
        ),
        Patient {
            id: "perm_005",
            name: "Chef Gusto",
            age: 35,
            occupation: "Pastry Wizard",
            avatar_seed: "Gusto",
            difficulty: Difficulty::Beginner,
        }
        .case(
            vec![stage(
                "s1",
                "Mama mia! Every time I taste my spicy lava cakes, I feel a fire in my chest! Is it love, or something else?",
                "c2",
                vec![
                    choice("c1", "Antihistamines", "Antihistamines are for allergies, not acid!"),
                    choice("c2", "Antacids & diet change", "Chef's kiss! Neutralizing the acid will help."),
                    choice("c3", "Headstand", "Gravity works against you there!"),
                ],
            )],
            &["Heartburn", "Acid taste in mouth", "Chest discomfort"],
            vitals("37.1°C", "130/85", "80 bpm"),
            "GERD (Acid Reflux)",
            "Gastroesophageal reflux disease (GERD) occurs when stomach acid frequently flows back into the tube connecting your mouth and stomach (esophagus). This backwash (acid reflux) can irritate the lining of your esophagus.",
            &[(
                "Mayo Clinic - GERD",
                "https://www.mayoclinic.org/diseases-conditions/gerd/symptoms-causes/syc-20361940",
            )],
        ),
        Patient {
            id: "perm_adv_001",
            name: "Fiona",
            age: 28,
            occupation: "Forest Ranger",
            avatar_seed: "Fiona",
            difficulty: Difficulty::Advanced,
        }
        .case(
            vec![
                stage(
                    "s1",
                    "Doctor, I was running the trail and suddenly my chest felt so tight. I can't catch my breath!",
                    "c_s1_2",
                    vec![
                        choice("c_s1_1", "Send home to rest", "She is having trouble breathing! You can't send her home."),
                        choice("c_s1_2", "Listen to lungs & check Oxygen", "Good call. You hear wheezing and her O2 is 92%."),
                        choice("c_s1_3", "Perform stomach surgery", "What? No! It's her lungs."),
                    ],
                ),
                stage(
                    "s2",
                    "Okay... *wheeze*... you checked my oxygen. It's a bit low... what should we do to open my airways?",
                    "c_s2_1",
                    vec![
                        choice("c_s2_1", "Administer Albuterol Nebulizer", "Excellent. The bronchodilator opens the airways immediately."),
                        choice("c_s2_2", "Give a glass of water", "Hydration is good, but it won't stop an asthma attack."),
                        choice("c_s2_3", "Check blood pressure again", "We need to treat the breathing, not check BP again."),
                    ],
                ),
            ],
            &["Shortness of breath", "Wheezing", "Chest tightness"],
            vitals("37.0°C", "120/80", "95 bpm"),
            "Acute Asthma Exacerbation",
            "Asthma is a condition in which your airways narrow and swell and may produce extra mucus. This can make breathing difficult and trigger coughing, wheezing when you breathe out and shortness of breath.",
            &[(
                "Mayo Clinic - Asthma",
                "https://www.mayoclinic.org/diseases-conditions/asthma/symptoms-causes/syc-20369653",
            )],
        ),
    ]
}

/// Static stand-in served when case generation fails. Never stored.
pub fn fallback_case() -> PatientCase {
    let mut case = Patient {
        id: "",
        name: "Dr. Fallback",
        age: 30,
        occupation: "Safety Coordinator",
        avatar_seed: "fallback-hero",
        difficulty: Difficulty::Beginner,
    }
    .case(
        vec![stage(
            "s1",
            "Oh no! It looks like my data got tangled. Can you prescribe a quick system restart?",
            "c1",
            vec![
                choice("c1", "Apply Digital Patches", "Connection restored! Thank you, Doctor."),
                choice("c2", "Defragment Drive", "A bit old school, but okay!"),
                choice("c3", "Buy New Pager", "Pagers are expensive, let's try the patch first!"),
            ],
        )],
        &["System Hiccup", "Glitchy vision"],
        vitals("36.6°C", "120/80", "60 bpm"),
        "Temporary Connection Glitch",
        "Sometimes even the best clinics have technical difficulties! This fallback case ensures you can keep playing while we fix the connection.",
        &[("Kawaii Clinic Support", "https://example.com")],
    );
    case.id = Uuid::new_v4().to_string();
    case.is_fallback = true;
    case
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case_validation::validate_case;

    #[test]
    fn test_permanent_cases_are_valid() {
        for case in permanent_cases() {
            assert!(validate_case(&case).is_ok(), "{} failed validation", case.id);
            assert!(!case.is_fallback);
        }
    }

    #[test]
    fn test_permanent_ids_are_unique() {
        let cases = permanent_cases();
        for (i, case) in cases.iter().enumerate() {
            assert!(cases[i + 1..].iter().all(|other| other.id != case.id));
        }
    }

    #[test]
    fn test_fallback_case() {
        let first = fallback_case();
        let second = fallback_case();
        assert!(first.is_fallback);
        assert_ne!(first.id, second.id);
        assert!(validate_case(&first).is_ok());
    }
}
